//! Capability-link signing and verification.
//!
//! A link carries `uid`, `ts` (epoch milliseconds as a decimal string) and
//! `sig` (hex HMAC-SHA-256 over `uid:ts`). The triple is the entire
//! external contract of the trust boundary; tokens are built at link
//! generation, re-verified on every request and never stored.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_BYTES: usize = 32;

/// Signs `(uid, ts)` with the shared secret, returning lowercase hex.
pub fn sign(secret: &str, uid: &str, ts_millis: i64) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("hmac accepts keys of any length");
    mac.update(uid.as_bytes());
    mac.update(b":");
    mac.update(ts_millis.to_string().as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a presented token against the shared secret and a freshness
/// window.
///
/// The timestamp must satisfy `|now − ts| ≤ ttl`, bounding both stale
/// tokens and forward clock skew by the same margin. The presented
/// signature must decode to exactly the expected digest length; a length
/// mismatch fails immediately (length is already public), everything else
/// goes through a constant-time comparison.
pub fn verify(
    secret: &str,
    uid: &str,
    ts: &str,
    sig: &str,
    now: DateTime<Utc>,
    ttl: std::time::Duration,
) -> bool {
    let Ok(ts_millis) = ts.parse::<i64>() else {
        return false;
    };

    let skew = now.timestamp_millis().abs_diff(ts_millis);
    if skew > ttl.as_millis() as u64 {
        return false;
    }

    let Ok(presented) = hex::decode(sig) else {
        return false;
    };
    if presented.len() != SIGNATURE_BYTES {
        return false;
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("hmac accepts keys of any length");
    mac.update(uid.as_bytes());
    mac.update(b":");
    mac.update(ts.as_bytes());
    mac.verify_slice(&presented).is_ok()
}

/// Builds the signed query suffix for an administrative link.
pub fn capability_query(secret: &str, uid: &str, issued_at: DateTime<Utc>) -> String {
    let ts = issued_at.timestamp_millis();
    format!("uid={uid}&ts={ts}&sig={}", sign(secret, uid, ts))
}
