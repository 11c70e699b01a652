use crate::error::{AuthError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Input validation utilities for the OTP auth service

// Hardcoded pattern, always valid
static MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9]{7,15}$").expect("hardcoded mobile regex is invalid - fix source code")
});

/// Validate mobile number shape: optional `+` followed by 7-15 digits
pub fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE_REGEX.is_match(mobile)
}

pub fn validate_mobile(mobile: &str) -> Result<()> {
    if is_valid_mobile(mobile) {
        Ok(())
    } else {
        Err(AuthError::Validation(
            "Mobile number must be 7-15 digits, optionally prefixed with +".to_string(),
        ))
    }
}

/// Mask phone number for logging
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", visible)
}
