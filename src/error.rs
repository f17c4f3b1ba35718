use reqwest::StatusCode;
use thiserror::Error;

use crate::proto::DecodeError;

/// Failures of the token handshake, secret store and Spotify calls.
///
/// Components convert these into `None`/`false` at their own boundary and log
/// them; only [`SpotifyError::NotInitialized`] is meant to reach a caller.
#[derive(Debug, Error)]
pub enum SpotifyError {
    /// Timeout or connection failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    HttpStatus(StatusCode),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A TOTP code was requested before any secret was installed.
    #[error("TOTP generator not initialized")]
    NotInitialized,

    #[error("auth token not available")]
    AuthUnavailable,

    #[error("secret table has no versions")]
    EmptySecretTable,

    #[error("invalid canvas message: {0}")]
    Decode(#[from] DecodeError),
}

impl From<serde_json::Error> for SpotifyError {
    fn from(err: serde_json::Error) -> Self {
        SpotifyError::MalformedResponse(err.to_string())
    }
}
