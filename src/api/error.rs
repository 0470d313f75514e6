use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{discovery::DiscoveryError, spotify::SpotifyError, warning};

/// Errors surfaced to API clients as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// No usable bearer token on the request (401).
    Unauthenticated,
    /// Missing or invalid request input (400).
    BadRequest(String),
    /// Spotify failed or was unreachable.
    Upstream { status: StatusCode, message: String },
    Internal(String),
}

impl ApiError {
    /// Maps a Spotify failure, logging the underlying cause.
    ///
    /// A 401 from Spotify means the token is no longer valid, which the
    /// client sees as being logged out. Other Spotify error statuses are
    /// passed through; transport failures become 502 and timeouts 504.
    pub fn from_spotify(context: &str, err: SpotifyError) -> Self {
        warning!("{}: {}", context, err);
        let status = match &err {
            SpotifyError::Status { status: 401, .. } => return ApiError::Unauthenticated,
            SpotifyError::Status { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            SpotifyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            SpotifyError::Http(_) | SpotifyError::InvalidResponse(_) => StatusCode::BAD_GATEWAY,
        };
        ApiError::Upstream {
            status,
            message: context.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthenticated => write!(f, "Unauthorized"),
            ApiError::BadRequest(msg) => write!(f, "{}", msg),
            ApiError::Upstream { message, .. } => write!(f, "{}", message),
            ApiError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<DiscoveryError> for ApiError {
    fn from(err: DiscoveryError) -> Self {
        warning!("Recommendations unavailable: {}", err);
        ApiError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            message: "Failed to fetch recommendations".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
