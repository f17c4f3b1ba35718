use std::{future::Future, net::SocketAddr, str::FromStr};

use axum::{Extension, Router, routing::get};

use crate::{Res, api, config, spotify::SpotifyClient};

pub fn router(client: SpotifyClient) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/spotify/track/{id}", get(api::track))
        .route("/spotify/track/{id}/canvas", get(api::track_canvas))
        .route("/spotify/album/{id}", get(api::album))
        .route("/spotify/playlist/{id}", get(api::playlist))
        .route("/spotify/search", get(api::search))
        .layer(Extension(client))
}

/// Serves the API on `SERVER_ADDRESS` until `shutdown` resolves.
pub async fn start_api_server<F>(client: SpotifyClient, shutdown: F) -> Res<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from_str(&config::server_addr())
        .map_err(|e| format!("Failed to parse server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API server listening");

    axum::serve(listener, router(client))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
