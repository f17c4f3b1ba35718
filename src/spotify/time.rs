use reqwest::Client;
use serde_json::Value;

use crate::{error::SpotifyError, spotify::web_player_headers, utils};

/// Best-effort estimate of the web player's clock.
#[derive(Debug, Clone)]
pub struct TimeSync {
    client: Client,
    url: String,
    sp_dc: String,
}

impl TimeSync {
    /// `sp_dc` goes out as the request cookie. Any failure of the request
    /// later falls back to the local clock, see [`TimeSync::now`].
    pub fn new(client: Client, url: impl Into<String>, sp_dc: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            sp_dc: sp_dc.into(),
        }
    }

    /// Server time in milliseconds, or the local clock if the server cannot
    /// be asked. Never fails.
    pub async fn now(&self) -> u64 {
        match self.server_time().await {
            Ok(ms) => ms,
            Err(e) => {
                tracing::debug!(error = %e, "server time unavailable, using local clock");
                utils::now_millis()
            }
        }
    }

    pub async fn server_time(&self) -> Result<u64, SpotifyError> {
        let response = self
            .client
            .get(&self.url)
            .headers(web_player_headers(&self.sp_dc))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyError::HttpStatus(status));
        }

        let body: Value = serde_json::from_slice(&response.bytes().await?)?;
        parse_server_time(&body).ok_or_else(|| {
            SpotifyError::MalformedResponse(format!("invalid serverTime in {}", body))
        })
    }
}

/// Reads `serverTime` (seconds, number or numeric string) as milliseconds.
pub fn parse_server_time(body: &Value) -> Option<u64> {
    let secs = match &body["serverTime"] {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some((secs * 1000.0) as u64)
}
