/// OTP issuance rate limiting
///
/// One counter per mobile number under `otp_requests:{mobile}`. Every
/// increment re-arms the counter's expiry to the full window, so the ceiling
/// reads as "N requests since your most recent one" rather than N per clock
/// hour. The window therefore slides with each request.
use crate::cache::KeyValueStore;
use crate::error::Result;
use crate::validators::mask_phone;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const RATE_LIMIT_PREFIX: &str = "otp_requests:";

#[derive(Clone)]
pub struct OtpRateLimiter {
    kv: Arc<dyn KeyValueStore>,
    limit: u32,
    window: Duration,
}

impl OtpRateLimiter {
    pub fn new(kv: Arc<dyn KeyValueStore>, limit: u32, window: Duration) -> Self {
        Self { kv, limit, window }
    }

    /// True once the counter has reached the ceiling.
    ///
    /// Fails open: an unreachable or corrupt counter reads as zero. This keeps
    /// OTP issuance available during a cache outage at the cost of the limit.
    pub async fn is_limited(&self, mobile: &str) -> bool {
        let count = match self.kv.get(&rate_key(mobile)).await {
            Ok(value) => value.and_then(|raw| raw.parse::<i64>().ok()).unwrap_or(0),
            Err(e) => {
                warn!(
                    phone = %mask_phone(mobile),
                    error = %e,
                    "Rate limit check failed; allowing request"
                );
                0
            }
        };

        if count >= i64::from(self.limit) {
            warn!(phone = %mask_phone(mobile), count, "Rate limit exceeded for phone");
            return true;
        }
        false
    }

    /// Count one request and slide the window forward.
    pub async fn increment(&self, mobile: &str) -> Result<i64> {
        self.kv.incr_with_expiry(&rate_key(mobile), self.window).await
    }
}

fn rate_key(mobile: &str) -> String {
    format!("{}{}", RATE_LIMIT_PREFIX, mobile)
}
