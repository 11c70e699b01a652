/// Service layer for the OTP auth service
///
/// - Rate limiting of OTP issuance
/// - OTP generation and storage
/// - Device registry and session bindings
/// - SMS delivery (Fast2SMS or log-only)
/// - Session lifecycle orchestration
/// - Blacklist sweeper (background task)
pub mod devices;
pub mod lifecycle;
pub mod otp;
pub mod rate_limit;
pub mod sessions;
pub mod sms;
pub mod sweeper;

pub use devices::DeviceRegistry;
pub use lifecycle::SessionLifecycle;
pub use otp::{FixedOtpGenerator, OtpGenerator, OtpStore, RandomOtpGenerator};
pub use rate_limit::OtpRateLimiter;
pub use sessions::SessionBinder;
pub use sms::{dispatcher_from_settings, Fast2SmsDispatcher, LoggingSmsDispatcher, SmsDispatcher};
pub use sweeper::spawn_blacklist_sweeper;
