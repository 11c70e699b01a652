use super::AppState;
use crate::error::AuthError;
use crate::models::DeviceFingerprint;
use crate::security::derive_fingerprint;
use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::debug;

/// Bearer-token guard for protected routes.
///
/// Strips an optional `Bearer ` prefix, runs the blacklist check and token
/// validation, and stores the resulting `AuthenticatedUser` in the request
/// extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::Unauthorized)?;

    let token = bearer_token(header_value).ok_or(AuthError::Unauthorized)?;
    let user = state.lifecycle.authenticate(token).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Token part of an `Authorization` header value; `None` if blank
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let token = header_value
        .strip_prefix("Bearer ")
        .unwrap_or(header_value)
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Fingerprint of the calling device.
///
/// Derived from the `User-Agent` header and the peer IP of the connection;
/// forwarding headers and request bodies are never consulted.
#[derive(Debug, Clone)]
pub struct ClientFingerprint(pub DeviceFingerprint);

#[async_trait]
impl<S> FromRequestParts<S> for ClientFingerprint
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let ip = match ConnectInfo::<SocketAddr>::from_request_parts(parts, state).await {
            Ok(ConnectInfo(addr)) => addr.ip().to_string(),
            Err(_) => {
                debug!("No peer address available; fingerprinting on user agent only");
                String::new()
            }
        };

        Ok(ClientFingerprint(derive_fingerprint(&user_agent, &ip)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_prefix_is_optional() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token(""), None);
    }
}
