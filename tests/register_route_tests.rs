use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use emberlink::db::RegistryStorage;
use emberlink::router::{EmberlinkState, emberlink_router};
use serde_json::Value;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use std::{env, fs, process};
use tower::ServiceExt;

async fn test_app(tag: &str) -> (Router, RegistryStorage, PathBuf) {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut path = env::temp_dir();
    path.push(format!("emberlink-{tag}-{}-{}.sqlite", process::id(), nanos));

    let storage = RegistryStorage::connect(&path)
        .await
        .expect("failed to open temp database");
    let state = EmberlinkState::new(storage.clone(), "homeassistant");
    (emberlink_router(state), storage, path)
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

async fn seed_entry_key(storage: &RegistryStorage, code: &str, serial: &str, expires_at: i64) {
    sqlx::query(
        "INSERT INTO entryKeys (code, serial, expiresAt, claimedBy, claimedAt) \
         VALUES (?, ?, ?, NULL, NULL)",
    )
    .bind(code)
    .bind(serial)
    .bind(expires_at)
    .execute(storage.pool())
    .await
    .expect("failed to seed entry key");
}

fn register_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request")
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body was not JSON")
}

#[tokio::test]
async fn register_then_list_round_trip() {
    let (app, storage, path) = test_app("register-e2e").await;
    seed_entry_key(&storage, "ABC123Z", "NEST-001", now_ms() + 60_000).await;

    // Lowercase input is normalized before lookup.
    let resp = app
        .clone()
        .oneshot(register_request(
            "/api/register",
            r#"{"code":"abc123z","userId":"homeassistant"}"#,
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["success"], Value::Bool(true));
    assert_eq!(body["serial"], "NEST-001");
    assert_eq!(body["message"], "Device NEST-001 registered to homeassistant");

    let resp = app
        .clone()
        .oneshot(get_request("/api/devices"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let devices = json_body(resp).await;
    let devices = devices.as_array().expect("devices response was not an array");
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["serial"], "NEST-001");
    assert!(devices[0]["createdAt"].is_i64());

    // Re-claiming the same code is an expected rejection, not an error.
    let resp = app
        .clone()
        .oneshot(register_request(
            "/api/register",
            r#"{"code":"abc123z","userId":"homeassistant"}"#,
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["success"], Value::Bool(false));
    assert_eq!(body["message"], "Invalid, expired, or already claimed entry key");
    assert!(body.get("serial").is_none());

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn malformed_codes_are_rejected_before_the_store() {
    let (app, storage, path) = test_app("bad-codes").await;
    seed_entry_key(&storage, "ABC123Z", "NEST-001", now_ms() + 60_000).await;

    for bad in ["AB12", "TOOLONGCODE", "AB12-34"] {
        let payload = format!(r#"{{"code":"{bad}","userId":"homeassistant"}}"#);
        let resp = app
            .clone()
            .oneshot(register_request("/api/register", &payload))
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "accepted {bad:?}");
        let body = json_body(resp).await;
        assert!(body["error"].as_str().is_some());
    }

    // No store mutation happened along the way.
    let key = storage
        .entry_key("ABC123Z")
        .await
        .expect("lookup failed")
        .expect("seeded key missing");
    assert!(key.claimed_by.is_none());

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn missing_fields_and_bad_json_are_400s() {
    let (app, _storage, path) = test_app("bad-bodies").await;

    for payload in [
        r#"{"code":"ABC123Z"}"#,
        r#"{"userId":"homeassistant"}"#,
        r#"{}"#,
        "not json at all",
    ] {
        let resp = app
            .clone()
            .oneshot(register_request("/api/register", payload))
            .await
            .expect("request failed");
        assert_eq!(
            resp.status(),
            StatusCode::BAD_REQUEST,
            "accepted {payload:?}"
        );
    }

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn unmatched_paths_are_plain_404s() {
    let (app, _storage, path) = test_app("not-found").await;

    let resp = app
        .clone()
        .oneshot(get_request("/api/unknown"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    assert_eq!(&bytes[..], b"Not Found");

    // Wrong method on a known suffix falls through to 404 as well.
    let resp = app
        .clone()
        .oneshot(register_request("/api/devices", "{}"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn options_preflight_is_empty_200() {
    let (app, _storage, path) = test_app("preflight").await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/register")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    assert!(bytes.is_empty());

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn routes_match_under_an_ingress_prefix() {
    let (app, storage, path) = test_app("ingress-prefix").await;
    seed_entry_key(&storage, "XYZ789Q", "NEST-002", now_ms() + 60_000).await;

    let resp = app
        .clone()
        .oneshot(register_request(
            "/api/hassio_ingress/abc123TOKEN/api/register",
            r#"{"code":"XYZ789Q","userId":"homeassistant"}"#,
        ))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["success"], Value::Bool(true));

    let resp = app
        .clone()
        .oneshot(get_request("/api/hassio_ingress/abc123TOKEN/api/devices"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let devices = json_body(resp).await;
    assert_eq!(devices.as_array().map(|a| a.len()), Some(1));

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn home_page_embeds_the_ingress_base_path() {
    let (app, _storage, path) = test_app("home-page").await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/")
                .header("x-ingress-path", "/api/hassio_ingress/abc123TOKEN")
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let html = std::str::from_utf8(&bytes).expect("page was not utf-8");
    assert!(html.contains("const BASE_PATH = '/api/hassio_ingress/abc123TOKEN';"));
    assert!(html.contains(r#"userId: 'homeassistant'"#));

    // Without the header the base path is empty and URLs stay relative.
    let resp = app
        .clone()
        .oneshot(get_request("/"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let html = std::str::from_utf8(&bytes).expect("page was not utf-8");
    assert!(html.contains("const BASE_PATH = '';"));

    let _ = fs::remove_file(&path);
}
