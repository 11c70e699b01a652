use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crypto_core::JwtError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Device not found")]
    DeviceNotFound,

    #[error("User already registered")]
    UserAlreadyExists,

    #[error("Too many OTP requests")]
    RateLimited,

    #[error("Invalid or expired OTP")]
    InvalidOtp,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token revoked")]
    TokenRevoked,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("SMS delivery failed: {0}")]
    Sms(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::UserNotFound | AuthError::DeviceNotFound => StatusCode::NOT_FOUND,
            AuthError::UserAlreadyExists => StatusCode::CONFLICT,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::InvalidOtp
            | AuthError::InvalidToken
            | AuthError::TokenRevoked
            | AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Database(_)
            | AuthError::Redis(_)
            | AuthError::Sms(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to the caller.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Validation(msg) => format!("Invalid input: {}", msg),
            AuthError::UserNotFound => "User not found".to_string(),
            AuthError::DeviceNotFound => "Device not found".to_string(),
            AuthError::UserAlreadyExists => "User already registered. Please log in.".to_string(),
            AuthError::RateLimited => "Too many OTP requests. Try again later.".to_string(),
            AuthError::InvalidOtp => "Invalid or expired OTP".to_string(),
            // Credential failures are deliberately indistinguishable
            AuthError::InvalidToken | AuthError::TokenRevoked | AuthError::Unauthorized => {
                "Invalid or expired token".to_string()
            }
            AuthError::Sms(_) => "Failed to send OTP via SMS".to_string(),
            AuthError::Database(_) | AuthError::Redis(_) | AuthError::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

// Conversions from external error types
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        AuthError::Database(err.to_string())
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Invalid(e) => {
                tracing::debug!("Token rejected: {}", e);
                AuthError::InvalidToken
            }
            other => {
                tracing::error!("JWT error: {}", other);
                AuthError::Internal(other.to_string())
            }
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("SMS gateway error: {}", err);
        AuthError::Sms(err.to_string())
    }
}
