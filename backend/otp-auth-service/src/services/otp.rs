/// One-time passcode generation and storage
///
/// At most one live code per mobile number, stored under `otp:{mobile}`.
/// Issuing a new code overwrites the previous one; verification compares the
/// stored value exactly and reports every mismatch the same way.
use crate::cache::KeyValueStore;
use crate::error::Result;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

const OTP_PREFIX: &str = "otp:";

/// Source of fresh OTP codes
pub trait OtpGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniformly random decimal codes of fixed length
#[derive(Debug, Clone, Copy)]
pub struct RandomOtpGenerator {
    length: usize,
}

impl RandomOtpGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomOtpGenerator {
    fn default() -> Self {
        Self::new(6)
    }
}

impl OtpGenerator for RandomOtpGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}

/// Always yields the same code. For tests and demos only.
#[derive(Debug, Clone)]
pub struct FixedOtpGenerator(String);

impl FixedOtpGenerator {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl OtpGenerator for FixedOtpGenerator {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

#[derive(Clone)]
pub struct OtpStore {
    kv: Arc<dyn KeyValueStore>,
    generator: Arc<dyn OtpGenerator>,
    ttl: Duration,
}

impl OtpStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, generator: Arc<dyn OtpGenerator>, ttl: Duration) -> Self {
        Self { kv, generator, ttl }
    }

    pub fn with_generator(mut self, generator: Arc<dyn OtpGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a code and store it, replacing any earlier one.
    pub async fn issue(&self, mobile: &str) -> Result<String> {
        let code = self.generator.generate();
        self.kv.set_ex(&otp_key(mobile), &code, self.ttl).await?;
        Ok(code)
    }

    /// Exact match against the live code. Missing, expired and wrong codes are
    /// all simply `false`.
    pub async fn verify(&self, mobile: &str, code: &str) -> Result<bool> {
        let stored = self.kv.get(&otp_key(mobile)).await?;
        Ok(matches!(stored, Some(stored) if stored == code))
    }

    /// Drop the code so it cannot be replayed.
    ///
    /// Returns false when the code was already gone. Of several concurrent
    /// verifications of one code, only the caller that sees `true` may proceed.
    pub async fn consume(&self, mobile: &str) -> Result<bool> {
        self.kv.del(&otp_key(mobile)).await
    }
}

fn otp_key(mobile: &str) -> String {
    format!("{}{}", OTP_PREFIX, mobile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryKeyValueStore;

    const MOBILE: &str = "+15550000001";

    fn store_with(generator: impl OtpGenerator + 'static) -> OtpStore {
        OtpStore::new(
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(generator),
            Duration::from_secs(300),
        )
    }

    #[test]
    fn test_random_codes_are_numeric_and_fixed_length() {
        let generator = RandomOtpGenerator::new(6);
        for _ in 0..50 {
            let code = generator.generate();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
        assert_eq!(RandomOtpGenerator::new(8).generate().len(), 8);
    }

    #[tokio::test]
    async fn test_issue_then_verify() {
        let store = store_with(FixedOtpGenerator::new("123456"));
        assert_eq!(store.issue(MOBILE).await.unwrap(), "123456");

        assert!(store.verify(MOBILE, "123456").await.unwrap());
        assert!(!store.verify(MOBILE, "654321").await.unwrap());
        assert!(!store.verify("+15550000002", "123456").await.unwrap());
    }

    #[tokio::test]
    async fn test_consume_prevents_replay() {
        let store = store_with(FixedOtpGenerator::new("123456"));
        store.issue(MOBILE).await.unwrap();
        assert!(store.consume(MOBILE).await.unwrap());
        assert!(!store.verify(MOBILE, "123456").await.unwrap());
        assert!(!store.consume(MOBILE).await.unwrap());
    }

    #[tokio::test]
    async fn test_new_code_replaces_previous() {
        let store = store_with(RandomOtpGenerator::default());
        let mut first = store.issue(MOBILE).await.unwrap();
        let mut second = store.issue(MOBILE).await.unwrap();
        while second == first {
            first = second;
            second = store.issue(MOBILE).await.unwrap();
        }
        assert!(!store.verify(MOBILE, &first).await.unwrap());
        assert!(store.verify(MOBILE, &second).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_code_expires() {
        let store = store_with(FixedOtpGenerator::new("123456"));
        store.issue(MOBILE).await.unwrap();
        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(!store.verify(MOBILE, "123456").await.unwrap());
    }
}
