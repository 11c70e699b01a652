/// HTTP API
///
/// Thin axum surface over [`SessionLifecycle`]. Handlers parse input, derive
/// the device fingerprint from the connection and delegate; no session logic
/// lives here.
///
/// Protected routes sit behind [`middleware::require_auth`], which performs
/// the blacklist check and token validation and injects the
/// [`AuthenticatedUser`](crate::models::AuthenticatedUser).
mod handlers;
pub mod middleware;

use crate::services::SessionLifecycle;
use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared HTTP server state
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<SessionLifecycle>,
}

impl AppState {
    pub fn new(lifecycle: SessionLifecycle) -> Self {
        Self {
            lifecycle: Arc::new(lifecycle),
        }
    }
}

/// Build the HTTP router with public and protected endpoints
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/user", get(handlers::current_user))
        .route("/user/devices", get(handlers::list_devices))
        .route("/device", delete(handlers::remove_device))
        .route("/devices/all", delete(handlers::remove_other_devices))
        .route("/logout", post(handlers::logout))
        .route("/logout/all", post(handlers::logout_all))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ORIGIN, header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_LENGTH])
        .max_age(Duration::from_secs(12 * 3600));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/resend-otp", post(handlers::resend_otp))
        .route("/verify", post(handlers::verify))
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
