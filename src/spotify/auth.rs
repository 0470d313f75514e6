use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{config, types::Token, utils};

use super::{SpotifyError, check_status};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    scope: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponse {
    fn into_token(self, previous_refresh_token: Option<&str>) -> Result<Token, SpotifyError> {
        let Some(access_token) = self.access_token.filter(|t| !t.is_empty()) else {
            let reason = self
                .error_description
                .or(self.error)
                .unwrap_or_else(|| "missing access_token".to_string());
            return Err(SpotifyError::InvalidResponse(reason));
        };

        Ok(Token {
            access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh_token.map(str::to_string))
                .unwrap_or_default(),
            scope: self.scope.unwrap_or_default(),
            expires_in: self.expires_in.unwrap_or(3600),
            obtained_at: utils::now_timestamp(),
        })
    }
}

/// Spotify accounts service client for the OAuth 2.0 PKCE flow.
///
/// The flow never needs the client secret:
/// 1. [`SpotifyAuth::authorize_url`] sends the listener to Spotify with the
///    S256 challenge of a fresh code verifier and an opaque `state`
/// 2. Spotify redirects back to the callback with `code` and `state`
/// 3. [`SpotifyAuth::exchange_code`] trades code + verifier for a [`Token`]
/// 4. [`SpotifyAuth::refresh`] renews the access token before it expires
#[derive(Debug, Clone)]
pub struct SpotifyAuth {
    client: Client,
    client_id: String,
    redirect_uri: String,
    scope: String,
    auth_url: Url,
    token_url: String,
}

impl SpotifyAuth {
    pub fn new(
        client_id: String,
        redirect_uri: String,
        scope: String,
        auth_url: &str,
        token_url: String,
        timeout: Duration,
    ) -> Result<Self, String> {
        let auth_url = Url::parse(auth_url).map_err(|e| format!("invalid auth url: {}", e))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| e.to_string())?;

        Ok(Self {
            client,
            client_id,
            redirect_uri,
            scope,
            auth_url,
            token_url,
        })
    }

    pub fn from_env() -> Result<Self, String> {
        Self::new(
            config::spotify_client_id()?,
            config::spotify_redirect_uri()?,
            config::spotify_scope(),
            &config::spotify_apiauth_url(),
            config::spotify_apitoken_url(),
            config::request_timeout(),
        )
    }

    /// Builds the URL the listener is redirected to for authorization.
    ///
    /// # Example
    ///
    /// ```
    /// let verifier = utils::generate_code_verifier();
    /// let url = auth.authorize_url(&utils::generate_code_challenge(&verifier), "state123");
    /// ```
    pub fn authorize_url(&self, code_challenge: &str, state: &str) -> String {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("code_challenge_method", "S256")
            .append_pair("code_challenge", code_challenge)
            .append_pair("state", state)
            .append_pair("scope", &self.scope);
        url.to_string()
    }

    /// Exchanges an authorization code for a token using the PKCE verifier
    /// generated when the login started.
    ///
    /// The authorization code is single-use and short lived, so the exchange
    /// happens directly in the callback handler.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Token, SpotifyError> {
        let res = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("code", code),
                ("code_verifier", verifier),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let json: TokenResponse = check_status(res).await?.json().await?;
        json.into_token(None)
    }

    /// Refreshes an expired access token.
    ///
    /// Spotify may or may not rotate the refresh token; when the response
    /// carries none, the old one is kept.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Token, SpotifyError> {
        let res = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.client_id.as_str()),
            ])
            .send()
            .await?;

        let json: TokenResponse = check_status(res).await?.json().await?;
        json.into_token(Some(refresh_token))
    }
}
