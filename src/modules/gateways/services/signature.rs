use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::core::{AppError, Result};

type HmacSha512 = Hmac<Sha512>;

fn keyed(secret: &str) -> Result<HmacSha512> {
    HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::internal(format!("Invalid HMAC key: {}", e)))
}

/// HMAC-SHA512 over the UTF-8 bytes of `canonical`, lowercase hex
pub fn sign(canonical: &str, secret: &str) -> Result<String> {
    let mut mac = keyed(secret)?;
    mac.update(canonical.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Recompute the digest and compare it against `supplied` in constant time.
///
/// `supplied` may be upper or lower case hex; anything that is not a hex
/// digest of the right length simply fails verification.
pub fn verify(canonical: &str, secret: &str, supplied: &str) -> bool {
    let Ok(supplied_bytes) = hex::decode(supplied.trim()) else {
        return false;
    };

    let Ok(mut mac) = keyed(secret) else {
        return false;
    };
    mac.update(canonical.as_bytes());

    // verify_slice compares in constant time and rejects length mismatches
    mac.verify_slice(&supplied_bytes).is_ok()
}
