/// Data models for users, devices and sessions
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic device identity derived from connection metadata
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceFingerprint(String);

impl DeviceFingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller identity established by a validated, unrevoked bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub mobile: String,
    /// The raw token as presented, without the `Bearer ` prefix
    pub token: String,
}

/// Result of a successful OTP issuance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpDispatch {
    /// Seconds until the issued code lapses
    pub expires_in: u64,
}

/// Token minted by a successful verification
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub fingerprint: DeviceFingerprint,
    /// True when this verification registered a previously unseen device
    pub new_device: bool,
}

/// Outcome of a logout from every device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogoutAllSummary {
    pub tokens_revoked: usize,
    pub devices_removed: u64,
}
