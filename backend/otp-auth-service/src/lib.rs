/// OTP Auth Service Library
///
/// SMS one-time-passcode authentication with per-device sessions.
///
/// ## Modules
///
/// - `cache`: Ephemeral key-value storage (Redis, in-memory)
/// - `config`: Service configuration
/// - `db`: Durable user and device storage (PostgreSQL, in-memory)
/// - `error`: Error types
/// - `http`: axum routes and auth middleware
/// - `models`: Data models
/// - `security`: Session tokens, device fingerprints, token revocation
/// - `services`: Rate limiting, OTP, sessions, SMS, lifecycle orchestration
/// - `validators`: Input validation
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod security;
pub mod services;
pub mod validators;

// Re-export commonly used types
pub use error::{AuthError, Result};
pub use services::SessionLifecycle;
