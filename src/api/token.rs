use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    server::AppState,
    session::{self, SESSION_COOKIE},
};

use super::ApiError;

/// The listener's Spotify access token.
///
/// Resolved from the server-side session named by the `sp_session` cookie,
/// falling back to tokens stored directly in cookies by older logins.
/// Handlers taking this extractor answer 401 when neither is present.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = session::parse_cookie_header(&parts.headers);

        if let Some(session_id) = cookies.get(SESSION_COOKIE) {
            if let Some(token) = state.sessions.access_token(session_id, &state.auth).await {
                return Ok(BearerToken(token));
            }
        }

        session::resolve_token(&cookies)
            .map(BearerToken)
            .ok_or(ApiError::Unauthenticated)
    }
}
