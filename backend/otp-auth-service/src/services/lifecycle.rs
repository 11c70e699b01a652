/// Session lifecycle orchestration
///
/// Drives a mobile number from registration through OTP issuance and
/// verification to per-device sessions, and back out through logout.
///
/// No in-process locks coordinate requests. Every step relies on single-key
/// atomicity of the underlying stores; the multi-step sequences (device
/// check-then-insert, logout-all enumerate-then-delete) are deliberately not
/// transactional. The worst outcome of a race is a duplicate device row.
use crate::cache::KeyValueStore;
use crate::config::SessionPolicy;
use crate::db::{DeviceResolution, IdentityStore};
use crate::error::{AuthError, Result};
use crate::models::{AuthenticatedUser, DeviceFingerprint, IssuedSession, LogoutAllSummary, OtpDispatch};
use crate::security::{JwtIssuer, RevocationRegistry};
use crate::services::devices::DeviceRegistry;
use crate::services::otp::{OtpGenerator, OtpStore, RandomOtpGenerator};
use crate::services::rate_limit::OtpRateLimiter;
use crate::services::sessions::SessionBinder;
use crate::services::sms::SmsDispatcher;
use crate::validators::{mask_phone, validate_mobile};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct SessionLifecycle {
    identities: Arc<dyn IdentityStore>,
    devices: DeviceRegistry,
    rate_limiter: OtpRateLimiter,
    otps: OtpStore,
    sessions: SessionBinder,
    revocations: RevocationRegistry,
    issuer: JwtIssuer,
    sms: Arc<dyn SmsDispatcher>,
    revocation_fail_open: bool,
}

impl SessionLifecycle {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        kv: Arc<dyn KeyValueStore>,
        issuer: JwtIssuer,
        sms: Arc<dyn SmsDispatcher>,
        policy: &SessionPolicy,
    ) -> Self {
        let generator = Arc::new(RandomOtpGenerator::new(policy.otp_length));

        Self {
            devices: DeviceRegistry::new(identities.clone()),
            identities,
            rate_limiter: OtpRateLimiter::new(
                kv.clone(),
                policy.otp_rate_limit,
                policy.rate_window(),
            ),
            otps: OtpStore::new(kv.clone(), generator, policy.otp_ttl()),
            sessions: SessionBinder::new(kv.clone(), policy.token_ttl()),
            revocations: RevocationRegistry::new(kv, policy.token_ttl()),
            issuer,
            sms,
            revocation_fail_open: policy.revocation_fail_open,
        }
    }

    /// Replace the OTP source, e.g. with a fixed code in tests.
    pub fn with_otp_generator(mut self, generator: Arc<dyn OtpGenerator>) -> Self {
        self.otps = self.otps.with_generator(generator);
        self
    }

    /// Handle for the background sweeper.
    pub fn revocations(&self) -> RevocationRegistry {
        self.revocations.clone()
    }

    /// Create a user. No OTP is sent.
    pub async fn register(&self, mobile: &str) -> Result<()> {
        validate_mobile(mobile)?;

        if self.identities.user_exists(mobile).await? {
            return Err(AuthError::UserAlreadyExists);
        }
        // Lost a race with a concurrent registration
        if !self.identities.insert_user(mobile).await? {
            return Err(AuthError::UserAlreadyExists);
        }

        info!(phone = %mask_phone(mobile), "User registered");
        Ok(())
    }

    pub async fn login(&self, mobile: &str) -> Result<OtpDispatch> {
        self.issue_otp(mobile, "login").await
    }

    pub async fn resend_otp(&self, mobile: &str) -> Result<OtpDispatch> {
        self.issue_otp(mobile, "resend").await
    }

    async fn issue_otp(&self, mobile: &str, purpose: &'static str) -> Result<OtpDispatch> {
        validate_mobile(mobile)?;

        if !self.identities.user_exists(mobile).await? {
            return Err(AuthError::UserNotFound);
        }
        if self.rate_limiter.is_limited(mobile).await {
            return Err(AuthError::RateLimited);
        }

        let code = self.otps.issue(mobile).await?;
        let requests = self.rate_limiter.increment(mobile).await?;

        self.sms.send(mobile, &code).await.map_err(|e| {
            error!(phone = %mask_phone(mobile), error = %e, "Failed to deliver OTP");
            e
        })?;

        info!(
            phone = %mask_phone(mobile),
            purpose,
            requests,
            "OTP sent successfully"
        );

        Ok(OtpDispatch {
            expires_in: self.otps.ttl().as_secs(),
        })
    }

    /// Exchange a live OTP for a session token bound to the caller's device.
    pub async fn verify(
        &self,
        mobile: &str,
        code: &str,
        fingerprint: &DeviceFingerprint,
    ) -> Result<IssuedSession> {
        validate_mobile(mobile)?;
        if code.trim().is_empty() {
            return Err(AuthError::Validation("OTP is required".to_string()));
        }

        if !self.otps.verify(mobile, code).await? {
            warn!(phone = %mask_phone(mobile), "Invalid or expired OTP attempt");
            return Err(AuthError::InvalidOtp);
        }
        if !self.identities.user_exists(mobile).await? {
            warn!(phone = %mask_phone(mobile), "OTP matched for unknown user");
            return Err(AuthError::InvalidOtp);
        }

        // A concurrent verification of the same code got there first
        if !self.otps.consume(mobile).await? {
            warn!(phone = %mask_phone(mobile), "OTP already consumed");
            return Err(AuthError::InvalidOtp);
        }

        let token = self.issuer.mint(mobile)?;
        let resolution = self.devices.resolve(mobile, fingerprint).await?;
        self.sessions.bind(mobile, fingerprint, &token).await?;

        info!(
            phone = %mask_phone(mobile),
            new_device = resolution == DeviceResolution::Registered,
            "Phone verified, session issued"
        );

        Ok(IssuedSession {
            token,
            fingerprint: fingerprint.clone(),
            new_device: resolution == DeviceResolution::Registered,
        })
    }

    /// Guard for protected calls: blacklist first, then the credential itself.
    ///
    /// A blacklist lookup that errors rejects the request unless the policy
    /// opts into fail-open.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser> {
        match self.revocations.is_revoked(token).await {
            Ok(true) => return Err(AuthError::TokenRevoked),
            Ok(false) => {}
            Err(e) if self.revocation_fail_open => {
                warn!(error = %e, "Blacklist check failed; treating token as not revoked");
            }
            Err(e) => return Err(e),
        }

        let claims = self.issuer.validate(token)?;

        Ok(AuthenticatedUser {
            mobile: claims.sub,
            token: token.to_string(),
        })
    }

    /// Blacklist the presented token. The device binding is left in place.
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.revocations.revoke(token).await
    }

    /// Revoke every device-bound token of the user, and the presented token
    /// even if a later login has replaced its binding, then forget all devices.
    pub async fn logout_all(&self, user: &AuthenticatedUser) -> Result<LogoutAllSummary> {
        let mobile = user.mobile.as_str();
        let mut summary = LogoutAllSummary::default();
        let mut presented_revoked = false;

        for fingerprint in self.devices.list_fingerprints(mobile).await? {
            let Some(token) = self.sessions.lookup_token(mobile, &fingerprint).await? else {
                continue;
            };
            self.revocations.revoke(&token).await?;
            self.sessions.unbind(mobile, &fingerprint).await?;
            presented_revoked |= token == user.token;
            summary.tokens_revoked += 1;
        }

        if !presented_revoked {
            self.revocations.revoke(&user.token).await?;
            summary.tokens_revoked += 1;
        }

        summary.devices_removed = self.devices.remove_all(mobile).await?;

        info!(
            phone = %mask_phone(mobile),
            tokens_revoked = summary.tokens_revoked,
            devices_removed = summary.devices_removed,
            "Logged out from all devices"
        );
        Ok(summary)
    }

    pub async fn list_devices(&self, user: &AuthenticatedUser) -> Result<Vec<String>> {
        self.devices.list_fingerprints(&user.mobile).await
    }

    pub async fn remove_device(&self, user: &AuthenticatedUser, fingerprint: &str) -> Result<()> {
        if fingerprint.trim().is_empty() {
            return Err(AuthError::Validation("device_fingerprint is required".to_string()));
        }
        self.devices.remove(&user.mobile, fingerprint).await?;
        info!(phone = %mask_phone(&user.mobile), "Device removed");
        Ok(())
    }

    /// Remove every device except `current`, which must be derived from the
    /// request itself.
    pub async fn remove_other_devices(
        &self,
        user: &AuthenticatedUser,
        current: &DeviceFingerprint,
    ) -> Result<u64> {
        let removed = self.devices.remove_all_except(&user.mobile, current).await?;
        info!(phone = %mask_phone(&user.mobile), removed, "Removed other devices");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryKeyValueStore;
    use crate::db::MemoryIdentityStore;
    use crate::services::otp::FixedOtpGenerator;
    use crate::services::sms::MockSmsDispatcher;

    const MOBILE: &str = "+10000000001";

    fn engine(sms: MockSmsDispatcher) -> (MemoryKeyValueStore, SessionLifecycle) {
        let kv = MemoryKeyValueStore::new();
        let issuer =
            JwtIssuer::from_secret("unit-test-secret", "otp-auth", chrono::Duration::hours(24))
                .unwrap();
        let engine = SessionLifecycle::new(
            Arc::new(MemoryIdentityStore::new()),
            Arc::new(kv.clone()),
            issuer,
            Arc::new(sms),
            &SessionPolicy::default(),
        )
        .with_otp_generator(Arc::new(FixedOtpGenerator::new("123456")));
        (kv, engine)
    }

    #[tokio::test]
    async fn test_login_sends_issued_code() {
        let mut sms = MockSmsDispatcher::new();
        sms.expect_send()
            .withf(|mobile, code| mobile == MOBILE && code == "123456")
            .times(1)
            .returning(|_, _| Ok(()));
        let (_, engine) = engine(sms);

        engine.register(MOBILE).await.unwrap();
        let dispatch = engine.login(MOBILE).await.unwrap();

        assert_eq!(dispatch.expires_in, 300);
    }

    #[tokio::test]
    async fn test_sms_failure_is_surfaced_not_retried() {
        let mut sms = MockSmsDispatcher::new();
        sms.expect_send()
            .times(1)
            .returning(|_, _| Err(AuthError::Sms("gateway down".to_string())));
        let (kv, engine) = engine(sms);

        engine.register(MOBILE).await.unwrap();
        assert!(matches!(engine.login(MOBILE).await, Err(AuthError::Sms(_))));

        // The request still counts against the limit
        assert_eq!(
            kv.get("otp_requests:+10000000001").await.unwrap().as_deref(),
            Some("1")
        );
    }

    #[tokio::test]
    async fn test_unregistered_login_never_reaches_sms() {
        let mut sms = MockSmsDispatcher::new();
        sms.expect_send().never();
        let (_, engine) = engine(sms);

        assert!(matches!(engine.login(MOBILE).await, Err(AuthError::UserNotFound)));
        assert!(matches!(
            engine.resend_otp("not-a-number").await,
            Err(AuthError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_blank_code_as_validation() {
        let (_, engine) = engine(MockSmsDispatcher::new());
        let fp = DeviceFingerprint::new("fp-a");
        assert!(matches!(
            engine.verify(MOBILE, "  ", &fp).await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            engine.verify(MOBILE, "000000", &fp).await,
            Err(AuthError::InvalidOtp)
        ));
    }

    #[tokio::test]
    async fn test_authenticate_round_trip() {
        let mut sms = MockSmsDispatcher::new();
        sms.expect_send().returning(|_, _| Ok(()));
        let (_, engine) = engine(sms);
        let fp = DeviceFingerprint::new("fp-a");

        engine.register(MOBILE).await.unwrap();
        engine.login(MOBILE).await.unwrap();
        let session = engine.verify(MOBILE, "123456", &fp).await.unwrap();
        assert!(session.new_device);

        let user = engine.authenticate(&session.token).await.unwrap();
        assert_eq!(user.mobile, MOBILE);
        assert_eq!(user.token, session.token);

        engine.logout(&session.token).await.unwrap();
        assert!(matches!(
            engine.authenticate(&session.token).await,
            Err(AuthError::TokenRevoked)
        ));
    }
}
