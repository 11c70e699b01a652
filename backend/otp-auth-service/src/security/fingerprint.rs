use crate::models::DeviceFingerprint;
use crypto_core::sha256_hex;

/// Derive the device fingerprint of a request.
///
/// Both inputs are taken verbatim. Identical inputs always give the same
/// fingerprint; two users behind the same browser and address share one.
pub fn derive_fingerprint(user_agent: &str, ip: &str) -> DeviceFingerprint {
    let mut material = String::with_capacity(user_agent.len() + ip.len());
    material.push_str(user_agent);
    material.push_str(ip);
    DeviceFingerprint::new(sha256_hex(material.as_bytes()))
}
