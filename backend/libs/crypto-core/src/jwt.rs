/// Session token issuance and validation
///
/// Tokens are HS256-signed JWTs keyed by a shared secret. Each token carries the
/// subject (the user's mobile number), `iat`, `exp` and a random `jti`, so two
/// tokens minted for the same subject within the same second are still distinct.
///
/// Validation is purely structural: signature, issuer and expiry. Revocation is
/// a separate concern handled by the caller.
///
/// ## Usage
///
/// ```rust
/// use chrono::Duration;
/// use crypto_core::jwt::JwtIssuer;
///
/// let issuer = JwtIssuer::from_secret("change-me", "otp-auth", Duration::hours(24)).unwrap();
/// let token = issuer.mint("+10000000001").unwrap();
/// let claims = issuer.validate(&token).unwrap();
/// assert_eq!(claims.sub, "+10000000001");
/// ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// Default session token lifetime (24 hours)
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Shared-secret signing; the issuer and the validator are the same process
const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT signing secret must not be empty")]
    EmptySecret,

    #[error("Failed to encode token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("Token validation failed: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// JWT claims carried by a session token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (mobile number)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
    /// Issuer
    pub iss: String,
}

/// Mints and validates session tokens with a shared secret.
#[derive(Clone)]
pub struct JwtIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtIssuer {
    /// Build an issuer from a shared secret.
    ///
    /// ## Errors
    ///
    /// Returns [`JwtError::EmptySecret`] when the secret is empty or whitespace.
    pub fn from_secret(secret: &str, issuer: impl Into<String>, ttl: Duration) -> Result<Self, JwtError> {
        if secret.trim().is_empty() {
            return Err(JwtError::EmptySecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
            ttl,
        })
    }

    /// Mint a token for `subject` valid from now for the configured lifetime.
    pub fn mint(&self, subject: &str) -> Result<String, JwtError> {
        self.mint_at(subject, Utc::now())
    }

    /// Mint a token as if it had been issued at `issued_at`.
    pub fn mint_at(&self, subject: &str, issued_at: DateTime<Utc>) -> Result<String, JwtError> {
        let expiry = issued_at + self.ttl;

        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expiry.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key).map_err(JwtError::Encode)
    }

    /// Validate signature, issuer and expiry and return the claims.
    ///
    /// Malformed encodings, bad signatures and elapsed expiry all surface as
    /// [`JwtError::Invalid`].
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::Invalid)
    }
}

// ============================================================================
// Tests
// ============================================================================
