use crate::{
    cli::{auth_manager, connect},
    error, info, success,
    totp::PERIOD_MS,
    utils,
};

pub async fn token() {
    let client = connect().await;

    let Some(token) = client.get_access_token().await else {
        error!("No access token available.");
    };
    let version = client.auth().totp_version().await.unwrap_or_default();

    success!("Token minted with TOTP secret version {}", version);
    println!("{}", token);
}

pub async fn totp() {
    let auth = auth_manager();

    let pb = utils::spinner("Fetching TOTP secrets...");
    auth.rotate_secrets().await;
    pb.finish_and_clear();

    let now = utils::now_millis();
    let code = match auth.totp().generate(now).await {
        Ok(code) => code,
        Err(e) => error!("Cannot generate TOTP code. Err: {}", e),
    };
    let version = auth.totp_version().await.unwrap_or_default();
    let remaining = (PERIOD_MS - now % PERIOD_MS).div_ceil(1000);

    info!("Secret version {}, valid for {}s", version, remaining);
    println!("{}", code);
}
