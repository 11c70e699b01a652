/// OTP delivery over SMS
///
/// Delivery is best effort and synchronous: a failed send is reported to the
/// caller and never retried here.
use crate::error::{AuthError, Result};
use crate::validators::mask_phone;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const SMS_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsDispatcher: Send + Sync {
    async fn send(&self, mobile: &str, code: &str) -> Result<()>;
}

/// Fast2SMS OTP route
pub struct Fast2SmsDispatcher {
    api_key: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl Fast2SmsDispatcher {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(SMS_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            http_client,
        })
    }
}

#[async_trait]
impl SmsDispatcher for Fast2SmsDispatcher {
    async fn send(&self, mobile: &str, code: &str) -> Result<()> {
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("authorization", self.api_key.as_str()),
                ("route", "otp"),
                ("variables_values", code),
                ("flash", "0"),
                ("numbers", mobile),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                phone = %mask_phone(mobile),
                status = %status,
                "Fast2SMS request rejected"
            );
            return Err(AuthError::Sms(format!("Fast2SMS API error: {} - {}", status, body)));
        }

        debug!(phone = %mask_phone(mobile), "Fast2SMS accepted OTP message");
        Ok(())
    }
}

/// Development dispatcher: writes the code to the log instead of sending it
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSmsDispatcher;

#[async_trait]
impl SmsDispatcher for LoggingSmsDispatcher {
    async fn send(&self, mobile: &str, code: &str) -> Result<()> {
        warn!(
            phone = %mask_phone(mobile),
            otp = %code,
            "SMS gateway not configured; OTP logged instead of sent"
        );
        Ok(())
    }
}

/// Pick the dispatcher for the configured gateway credentials.
pub fn dispatcher_from_settings(
    settings: &crate::config::SmsSettings,
) -> Result<Box<dyn SmsDispatcher>> {
    match settings.api_key.as_deref() {
        Some(key) => {
            info!("Fast2SMS dispatcher initialized");
            Ok(Box::new(Fast2SmsDispatcher::new(key, &settings.base_url)?))
        }
        None => {
            warn!("FAST2SMS_API_KEY not set; running with logging SMS dispatcher");
            Ok(Box::new(LoggingSmsDispatcher))
        }
    }
}
