use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::spotify::SpotifyClient;

/// Liveness plus whether a token and a TOTP secret are currently held.
pub async fn health(Extension(client): Extension<SpotifyClient>) -> Json<Value> {
    let auth = client.auth();
    let has_token = auth.token().await.is_some();
    let totp_version = auth.totp_version().await;

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "auth": {
            "token": has_token,
            "totpVersion": totp_version
        }
    }))
}
