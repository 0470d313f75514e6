use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderName, header::SET_COOKIE},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    info,
    server::AppState,
    session::{self, CHUNK_COUNT_COOKIE, LEGACY_TOKEN_COOKIE, SESSION_COOKIE, TOKEN_COOKIE},
    success, utils, warning,
};

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn cookie_header(name: &str, value: &str, max_age: u64, secure: bool) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax{}",
        name,
        value,
        max_age,
        if secure { "; Secure" } else { "" }
    )
}

fn redirect_page(app_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
    <head>
        <title>Authenticating...</title>
        <meta http-equiv="refresh" content="1;url={app_url}/">
    </head>
    <body style="background:#000;color:#fff;display:flex;justify-content:center;align-items:center;height:100vh;font-family:sans-serif;">
        <p>Finalizing login...</p>
    </body>
</html>"#,
        app_url = app_url
    )
}

/// Starts the PKCE login and redirects to Spotify's authorization page.
pub async fn login(State(state): State<AppState>) -> Redirect {
    let (oauth_state, verifier) = state.sessions.begin_login().await;
    let challenge = utils::generate_code_challenge(&verifier);
    info!("Redirecting to Spotify for authorization");
    Redirect::to(&state.auth.authorize_url(&challenge, &oauth_state))
}

/// OAuth callback: exchanges the code, opens a server-side session and hands
/// the browser the session cookie.
///
/// The response is a small HTML page that refreshes to the app instead of a
/// bare redirect, so the browser stores the cookie before navigating.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    if let Some(error) = params.error {
        return Err(ApiError::BadRequest(format!(
            "Authorization denied: {}",
            error
        )));
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Err(ApiError::BadRequest("Missing code".to_string()));
    };

    let verifier = match params.state {
        Some(oauth_state) => state.sessions.take_pending(&oauth_state).await,
        None => None,
    };
    let Some(verifier) = verifier else {
        return Err(ApiError::BadRequest(
            "Unknown or expired login state".to_string(),
        ));
    };

    let token = match state.auth.exchange_code(&code, &verifier).await {
        Ok(token) => token,
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            return Err(ApiError::Internal("Auth failed".to_string()));
        }
    };

    let session_id = state.sessions.create(token).await;
    success!("Listener logged in");

    let cookie = cookie_header(
        SESSION_COOKIE,
        &session_id,
        state.session_max_age,
        state.secure_cookies(),
    );
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Html(redirect_page(&state.app_url)),
    )
        .into_response())
}

/// Ends the session and expires every token cookie the browser still holds,
/// including chunks left over from older logins.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let cookies = session::parse_cookie_header(&headers);
    if let Some(session_id) = cookies.get(SESSION_COOKIE) {
        state.sessions.remove(session_id).await;
    }

    let mut names: Vec<String> = [
        SESSION_COOKIE,
        TOKEN_COOKIE,
        CHUNK_COUNT_COOKIE,
        LEGACY_TOKEN_COOKIE,
    ]
    .iter()
    .map(|n| n.to_string())
    .collect();
    let mut chunks: Vec<String> = cookies
        .keys()
        .filter(|name| name.starts_with(&format!("{}.", TOKEN_COOKIE)))
        .cloned()
        .collect();
    chunks.sort();
    names.extend(chunks);

    let secure = state.secure_cookies();
    let expired: Vec<(HeaderName, String)> = names
        .iter()
        .map(|name| (SET_COOKIE, cookie_header(name, "", 0, secure)))
        .collect();

    (
        AppendHeaders(expired),
        Redirect::to(&format!("{}/", state.app_url)),
    )
}
