/// Security module for session credentials
///
/// - **crypto-core::jwt**: shared HS256 session token issuer
/// - **fingerprint**: device identity derived from connection metadata
/// - **token_revocation**: blacklist of logged-out tokens
// Re-export JWT functionality from shared crypto-core library
pub use crypto_core::jwt;
pub use crypto_core::jwt::{Claims, JwtIssuer};

pub mod fingerprint;
pub mod token_revocation;

pub use fingerprint::derive_fingerprint;
pub use token_revocation::{RevocationRegistry, SweepReport};
