use reqwest::Client;
use serde::Serialize;

use crate::{
    error::SpotifyError,
    spotify::web_player_headers,
    totp::{ActiveTotp, window_start},
    types::TokenResponse,
};

pub const AUTH_REASON: &str = "init";
pub const AUTH_PRODUCT_TYPE: &str = "mobile-web-player";

/// Query parameters of the web player token request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub reason: String,
    pub product_type: String,
    /// Code for the local clock.
    pub totp: String,
    pub totp_ver: String,
    /// Code for the server clock, rounded down to its 30 s window.
    pub totp_server: String,
}

impl AuthPayload {
    /// Builds the payload from one generator snapshot so both codes and the
    /// version label always belong together.
    pub fn new(active: &ActiveTotp, local_ms: u64, server_ms: u64) -> Self {
        Self {
            reason: AUTH_REASON.to_string(),
            product_type: AUTH_PRODUCT_TYPE.to_string(),
            totp: active.generator.generate(local_ms),
            totp_ver: active.version.clone(),
            totp_server: active.generator.generate(window_start(server_ms)),
        }
    }
}

/// Exchanges the session cookie plus TOTP codes for an access token.
///
/// Returns the bare token, without the `Bearer ` prefix.
pub async fn request_access_token(
    client: &Client,
    token_url: &str,
    sp_dc: &str,
    payload: &AuthPayload,
) -> Result<String, SpotifyError> {
    let response = client
        .get(token_url)
        .query(payload)
        .headers(web_player_headers(sp_dc))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SpotifyError::HttpStatus(status));
    }

    let body = response.bytes().await?;
    let token: TokenResponse = serde_json::from_slice(&body)?;

    token
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| SpotifyError::MalformedResponse("no accessToken in response".to_string()))
}
