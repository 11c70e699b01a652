use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use otp_auth_service::cache::MemoryKeyValueStore;
use otp_auth_service::config::SessionPolicy;
use otp_auth_service::db::MemoryIdentityStore;
use otp_auth_service::http::{build_router, AppState};
use otp_auth_service::security::{derive_fingerprint, JwtIssuer};
use otp_auth_service::services::{FixedOtpGenerator, LoggingSmsDispatcher, SessionLifecycle};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

const MOBILE: &str = "+10000000001";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64)";

fn app_from(addr: &str) -> (Router, MemoryIdentityStore) {
    let identities = MemoryIdentityStore::new();
    let issuer =
        JwtIssuer::from_secret("http-test-secret", "otp-auth", chrono::Duration::hours(24))
            .unwrap();
    let lifecycle = SessionLifecycle::new(
        Arc::new(identities.clone()),
        Arc::new(MemoryKeyValueStore::new()),
        issuer,
        Arc::new(LoggingSmsDispatcher),
        &SessionPolicy::default(),
    )
    .with_otp_generator(Arc::new(FixedOtpGenerator::new("123456")));

    let peer: SocketAddr = addr.parse().unwrap();
    let router = build_router(AppState::new(lifecycle)).layer(MockConnectInfo(peer));
    (router, identities)
}

fn app() -> Router {
    app_from("203.0.113.7:50123").0
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::USER_AGENT, USER_AGENT);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn sign_in(app: &Router) -> String {
    let (status, _) = call(app, Method::POST, "/register", None, Some(json!({ "mobile": MOBILE }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(app, Method::POST, "/login", None, Some(json!({ "mobile": MOBILE }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        app,
        Method::POST,
        "/verify",
        None,
        Some(json!({ "mobile": MOBILE, "otp": "123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let (status, _) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn public_flow_status_codes() {
    let app = app();

    let (status, _) = call(&app, Method::POST, "/login", None, Some(json!({ "mobile": MOBILE }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::POST, "/register", None, Some(json!({ "mobile": MOBILE }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, Method::POST, "/register", None, Some(json!({ "mobile": MOBILE }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, body) = call(&app, Method::POST, "/resend-otp", None, Some(json!({ "mobile": MOBILE }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expires_in"], 300);

    let (status, _) = call(
        &app,
        Method::POST,
        "/verify",
        None,
        Some(json!({ "mobile": MOBILE, "otp": "000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::POST, "/login", None, Some(json!({ "phone": MOBILE }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::POST, "/register", None, Some(json!({ "mobile": "12" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rate_limit_surfaces_as_429() {
    let app = app();
    call(&app, Method::POST, "/register", None, Some(json!({ "mobile": MOBILE }))).await;

    for _ in 0..6 {
        let (status, _) = call(&app, Method::POST, "/login", None, Some(json!({ "mobile": MOBILE }))).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = call(&app, Method::POST, "/login", None, Some(json!({ "mobile": MOBILE }))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = call(&app, Method::GET, "/user", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = sign_in(&app).await;
    let (status, body) = call(&app, Method::GET, "/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mobile"], MOBILE);
}

#[tokio::test]
async fn device_fingerprint_comes_from_the_connection() {
    let app = app();
    let token = sign_in(&app).await;

    let (status, body) = call(&app, Method::GET, "/user/devices", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let expected = derive_fingerprint(USER_AGENT, "203.0.113.7");
    assert_eq!(body["devices"], json!([expected.as_str()]));
}

#[tokio::test]
async fn logout_then_token_is_rejected() {
    let app = app();
    let token = sign_in(&app).await;

    let (status, _) = call(&app, Method::POST, "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::GET, "/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn logout_all_clears_devices() {
    let (app, identities) = app_from("203.0.113.7:50123");
    let token = sign_in(&app).await;

    let (status, body) = call(&app, Method::POST, "/logout/all", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokens_revoked"], 1);
    assert_eq!(body["devices_removed"], 1);
    assert_eq!(identities.device_row_count(MOBILE).await, 0);

    let (status, _) = call(&app, Method::GET, "/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn device_removal_endpoints() {
    let app = app();
    let token = sign_in(&app).await;

    let (status, body) = call(&app, Method::DELETE, "/devices/all", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 0);
    assert_eq!(body["message"], "No other devices found");

    let (status, _) = call(
        &app,
        Method::DELETE,
        "/device",
        Some(&token),
        Some(json!({ "device_fingerprint": "unknown" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let current = derive_fingerprint(USER_AGENT, "203.0.113.7");
    let (status, _) = call(
        &app,
        Method::DELETE,
        "/device",
        Some(&token),
        Some(json!({ "device_fingerprint": current.as_str() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&app, Method::GET, "/user/devices", Some(&token), None).await;
    assert_eq!(body["devices"], json!([]));
}
