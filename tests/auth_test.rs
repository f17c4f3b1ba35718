//! Token handshake and secret rotation against a mock web player.

use std::{sync::Arc, time::Duration};

use serde_json::json;
use spcanvas::{
    config::{Endpoints, ServiceOptions},
    management::{AuthManager, secrets::fallback_secret},
    totp::{TotpGenerator, window_start},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

fn options(server: &MockServer, sp_dc: &str) -> ServiceOptions {
    ServiceOptions {
        sp_dc: sp_dc.to_string(),
        endpoints: Endpoints::with_base(&server.uri()),
        ..ServiceOptions::default()
    }
}

fn fallback_generator() -> TotpGenerator {
    TotpGenerator::from_secret(&fallback_secret().1).unwrap()
}

async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clientId": "d8a5ed958d274c2e8ee717e6a4b0971d",
            "accessToken": token,
            "accessTokenExpirationTimestampMs": 1_700_003_600_000u64,
            "isAnonymous": true
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_newest_secret_version_is_used() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secrets/secretDict.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "3": [12, 56, 76, 33],
            "10": [99, 111, 47, 88],
            "2": [1, 2, 3]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/token"))
        .and(query_param("totpVer", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "tok" })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthManager::new(options(&server, "abc")).unwrap();
    assert!(auth.initialize().await);
    assert_eq!(auth.totp_version().await.as_deref(), Some("10"));
    assert_eq!(auth.token().await.as_deref(), Some("Bearer tok"));
}

#[tokio::test]
async fn test_unreachable_secrets_fall_back_to_embedded_version() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secrets/secretDict.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/token"))
        .and(query_param("totpVer", "19"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "fallback" })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthManager::new(options(&server, "abc")).unwrap();
    assert!(auth.initialize().await);
    assert_eq!(auth.totp_version().await.as_deref(), Some("19"));
    assert_eq!(auth.token().await.as_deref(), Some("Bearer fallback"));
}

#[tokio::test]
async fn test_malformed_secret_table_falls_back() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secrets/secretDict.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .mount(&server)
        .await;

    let auth = AuthManager::new(options(&server, "")).unwrap();
    assert!(!auth.rotate_secrets().await);
    assert_eq!(auth.totp_version().await.as_deref(), Some("19"));
}

#[tokio::test]
async fn test_token_request_carries_quantized_server_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/server-time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "serverTime": 1_700_000_000 })))
        .mount(&server)
        .await;

    let expected = fallback_generator().generate(window_start(1_700_000_000_000));
    assert_eq!(expected, "680052");

    Mock::given(method("GET"))
        .and(path("/api/token"))
        .and(query_param("reason", "init"))
        .and(query_param("productType", "mobile-web-player"))
        .and(query_param("totpVer", "19"))
        .and(query_param("totpServer", expected.as_str()))
        .and(header("cookie", "sp_dc=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "tok" })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthManager::new(options(&server, "abc")).unwrap();
    assert!(auth.initialize().await);
    assert_eq!(auth.token().await.as_deref(), Some("Bearer tok"));
}

#[tokio::test]
async fn test_secret_fetch_is_throttled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secrets/secretDict.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "7": [1, 2, 3] })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthManager::new(options(&server, "")).unwrap();
    assert!(auth.rotate_secrets().await);
    assert!(!auth.rotate_secrets().await);
    assert_eq!(auth.totp_version().await.as_deref(), Some("7"));
}

#[tokio::test]
async fn test_rotation_installs_newer_version() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secrets/secretDict.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "3": [1, 2, 3] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/secrets/secretDict.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "3": [1, 2, 3],
            "4": [4, 5, 6]
        })))
        .mount(&server)
        .await;

    let options = ServiceOptions {
        secrets_refresh_interval: Duration::ZERO,
        ..options(&server, "")
    };
    let auth = AuthManager::new(options).unwrap();

    assert!(auth.rotate_secrets().await);
    assert_eq!(auth.totp_version().await.as_deref(), Some("3"));
    assert!(auth.rotate_secrets().await);
    assert_eq!(auth.totp_version().await.as_deref(), Some("4"));
    // same version again
    assert!(!auth.rotate_secrets().await);
}

#[tokio::test]
async fn test_concurrent_refreshes_share_one_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "shared" }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthManager::new(options(&server, "abc")).unwrap();
    auth.totp().install("19", fallback_generator()).await;

    let (first, second) = tokio::join!(auth.refresh(), auth.refresh());
    assert!(first);
    assert!(second);
    assert_eq!(auth.token().await.as_deref(), Some("Bearer shared"));
}

#[tokio::test]
async fn test_refresh_after_rotation_does_not_reuse_older_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/token"))
        .and(query_param("totpVer", "20"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/token"))
        .and(query_param("totpVer", "21"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "new" })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthManager::new(options(&server, "abc")).unwrap();
    auth.totp().install("20", fallback_generator()).await;

    let (stale, rotated) = tokio::join!(auth.refresh(), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        auth.totp()
            .install("21", TotpGenerator::new(b"another key").unwrap())
            .await;
        auth.refresh().await
    });

    assert!(!stale);
    assert!(rotated);
    assert_eq!(auth.token().await.as_deref(), Some("Bearer new"));
}

#[tokio::test]
async fn test_concurrent_rotations_fetch_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secrets/secretDict.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "7": [1, 2, 3] }))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthManager::new(options(&server, "")).unwrap();

    let (first, second) = tokio::join!(auth.rotate_secrets(), auth.rotate_secrets());
    assert!(first ^ second, "exactly one rotation installs the secret");
    assert_eq!(auth.totp_version().await.as_deref(), Some("7"));
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "first" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let auth = AuthManager::new(options(&server, "abc")).unwrap();
    auth.totp().install("19", fallback_generator()).await;

    assert!(auth.refresh().await);
    assert!(!auth.refresh().await);
    assert_eq!(auth.token().await.as_deref(), Some("Bearer first"));
}

#[tokio::test]
async fn test_token_response_without_token_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "" })))
        .mount(&server)
        .await;

    let auth = AuthManager::new(options(&server, "abc")).unwrap();
    auth.totp().install("19", fallback_generator()).await;

    assert!(!auth.refresh().await);
    assert!(auth.token().await.is_none());
    assert!(auth.require_token().await.is_err());
}

#[tokio::test]
async fn test_refresh_is_skipped_without_sp_dc() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "tok" })))
        .expect(0)
        .mount(&server)
        .await;

    let auth = AuthManager::new(options(&server, "")).unwrap();
    assert!(!auth.initialize().await);
    assert_eq!(auth.totp_version().await.as_deref(), Some("19"));
}

#[tokio::test]
async fn test_refresh_before_any_secret_fails() {
    let server = MockServer::start().await;
    mount_token(&server, "tok").await;

    let auth = AuthManager::new(options(&server, "abc")).unwrap();
    assert!(!auth.refresh().await);
    assert!(auth.token().await.is_none());
}

#[tokio::test]
async fn test_shutdown_stops_schedules() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secrets/secretDict.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "5": [1, 2, 3] })))
        .mount(&server)
        .await;

    let options = ServiceOptions {
        secrets_refresh_interval: Duration::from_millis(100),
        token_refresh_interval: Duration::from_millis(100),
        ..options(&server, "")
    };
    let auth = Arc::new(AuthManager::new(options).unwrap());

    auth.start().await;
    // second start is a no-op
    auth.start().await;

    tokio::time::sleep(Duration::from_millis(350)).await;
    auth.shutdown();
    tokio::time::sleep(Duration::from_millis(150)).await;

    let fetched = server.received_requests().await.unwrap().len();
    assert!(fetched >= 2, "expected startup and scheduled fetches, got {}", fetched);

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), fetched);
}

#[tokio::test]
async fn test_start_obtains_token() {
    let server = MockServer::start().await;
    mount_token(&server, "started").await;

    let auth = Arc::new(AuthManager::new(options(&server, "abc")).unwrap());
    auth.start().await;
    assert_eq!(auth.token().await.as_deref(), Some("Bearer started"));
    auth.shutdown();
}
