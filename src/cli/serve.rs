use crate::{cli::auth_manager, error, info, server, spotify::SpotifyClient, success, warning};

pub async fn serve() {
    let auth = auth_manager();
    auth.start().await;

    if auth.token().await.is_none() {
        warning!("Started without an access token. Spotify routes answer 404 until a refresh succeeds.");
    }

    let client = SpotifyClient::new(auth.clone());
    info!("Serving API. Press Ctrl+C to stop.");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
        }
    };

    let result = server::start_api_server(client, shutdown).await;
    auth.shutdown();

    match result {
        Ok(()) => success!("Server stopped"),
        Err(e) => error!("Server failed. Err: {}", e),
    }
}
