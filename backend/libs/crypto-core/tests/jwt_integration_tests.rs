/// Integration tests for crypto-core session tokens
///
/// This test module covers:
/// - Issuer construction
/// - Token expiration handling
/// - Claims extraction
/// - Error handling for invalid tokens
use chrono::{Duration, Utc};
use crypto_core::jwt::{JwtError, JwtIssuer, DEFAULT_TOKEN_TTL_HOURS};
use crypto_core::sha256_hex;

fn issuer() -> JwtIssuer {
    JwtIssuer::from_secret(
        "integration-secret",
        "otp-auth",
        Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
    )
    .unwrap()
}

#[test]
fn test_blank_secret_is_rejected() {
    assert!(matches!(
        JwtIssuer::from_secret("  ", "otp-auth", Duration::hours(1)),
        Err(JwtError::EmptySecret)
    ));
}

#[test]
fn test_claims_carry_subject_and_lifetime() {
    let issuer = issuer();
    let before = Utc::now().timestamp();
    let token = issuer.mint("+10000000001").unwrap();
    let claims = issuer.validate(&token).unwrap();

    assert_eq!(claims.sub, "+10000000001");
    assert!(claims.iat >= before);
    assert_eq!(claims.exp, claims.iat + DEFAULT_TOKEN_TTL_HOURS * 3600);
    assert!(!claims.jti.is_empty());
}

#[test]
fn test_expiry_boundary() {
    let issuer = issuer();
    let almost = issuer
        .mint_at("+10000000001", Utc::now() - Duration::hours(23) - Duration::minutes(59))
        .unwrap();
    assert!(issuer.validate(&almost).is_ok());

    let elapsed = issuer
        .mint_at("+10000000001", Utc::now() - Duration::hours(24) - Duration::seconds(5))
        .unwrap();
    assert!(matches!(issuer.validate(&elapsed), Err(JwtError::Invalid(_))));
}

#[test]
fn test_tampered_token_is_rejected() {
    let issuer = issuer();
    let token = issuer.mint("+10000000001").unwrap();
    let mut parts: Vec<&str> = token.split('.').collect();
    let forged_payload = issuer.mint("+19999999999").unwrap();
    let forged: Vec<&str> = forged_payload.split('.').collect();
    parts[1] = forged[1];

    assert!(issuer.validate(&parts.join(".")).is_err());
}

#[test]
fn test_token_hash_is_stable_and_opaque() {
    let token = issuer().mint("+10000000001").unwrap();
    let digest = sha256_hex(token.as_bytes());
    assert_eq!(digest, sha256_hex(token.as_bytes()));
    assert_eq!(digest.len(), 64);
    assert!(!digest.contains(&token));
}
