use super::middleware::ClientFingerprint;
use super::AppState;
use crate::error::{AuthError, Result};
use crate::models::AuthenticatedUser;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct MobileRequest {
    pub mobile: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub mobile: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct DeviceRequest {
    pub device_fingerprint: String,
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| AuthError::Validation(rejection.body_text()))
}

/// Health check endpoint (no auth required)
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<MobileRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let request = body(payload)?;
    state.lifecycle.register(&request.mobile).await?;
    Ok(Json(json!({ "message": "User registered successfully" })))
}

pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<MobileRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let request = body(payload)?;
    let dispatch = state.lifecycle.login(&request.mobile).await?;
    Ok(Json(json!({
        "message": "OTP sent successfully",
        "expires_in": dispatch.expires_in,
    })))
}

pub async fn resend_otp(
    State(state): State<AppState>,
    payload: std::result::Result<Json<MobileRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let request = body(payload)?;
    let dispatch = state.lifecycle.resend_otp(&request.mobile).await?;
    Ok(Json(json!({
        "message": "OTP resent successfully",
        "expires_in": dispatch.expires_in,
    })))
}

pub async fn verify(
    State(state): State<AppState>,
    ClientFingerprint(fingerprint): ClientFingerprint,
    payload: std::result::Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let request = body(payload)?;
    let session = state
        .lifecycle
        .verify(&request.mobile, &request.otp, &fingerprint)
        .await?;
    Ok(Json(json!({
        "message": "OTP verified, login successful",
        "token": session.token,
    })))
}

pub async fn current_user(Extension(user): Extension<AuthenticatedUser>) -> Json<Value> {
    Json(json!({
        "message": "User details retrieved successfully",
        "mobile": user.mobile,
    }))
}

pub async fn list_devices(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Value>> {
    let devices = state.lifecycle.list_devices(&user).await?;
    Ok(Json(json!({ "devices": devices })))
}

pub async fn remove_device(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: std::result::Result<Json<DeviceRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let request = body(payload)?;
    state
        .lifecycle
        .remove_device(&user, &request.device_fingerprint)
        .await?;
    Ok(Json(json!({ "message": "Device removed successfully" })))
}

pub async fn remove_other_devices(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ClientFingerprint(current): ClientFingerprint,
) -> Result<Json<Value>> {
    let removed = state.lifecycle.remove_other_devices(&user, &current).await?;
    let message = if removed == 0 {
        "No other devices found"
    } else {
        "All other devices removed successfully, current device remains"
    };
    Ok(Json(json!({ "message": message, "removed": removed })))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Value>> {
    state.lifecycle.logout(&user.token).await?;
    Ok(Json(json!({ "message": "Logged out successfully" })))
}

pub async fn logout_all(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<Value>> {
    let summary = state.lifecycle.logout_all(&user).await?;
    Ok(Json(json!({
        "message": "Logged out from all devices successfully",
        "tokens_revoked": summary.tokens_revoked,
        "devices_removed": summary.devices_removed,
    })))
}
