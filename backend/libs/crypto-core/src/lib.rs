//! Shared crypto primitives: SHA-256 digests and signed session tokens.
pub mod hash;
pub mod jwt;

pub use hash::{sha256, sha256_hex};
pub use jwt::{Claims, JwtError, JwtIssuer};
