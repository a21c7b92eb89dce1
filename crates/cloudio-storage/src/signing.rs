//! Signed download URLs for locally served blobs.
//!
//! A signature is `hex(sha256(secret ":" key ":" expires))`, where `expires`
//! is a Unix timestamp in seconds. The secret never leaves the server.

use sha2::{Digest, Sha256};

use cloudio_core::error::AppError;
use cloudio_core::result::AppResult;

/// Signs and verifies blob download URLs.
#[derive(Clone)]
pub struct UrlSigner {
    secret: String,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("secret", &"****")
            .finish()
    }
}

impl UrlSigner {
    /// Create a signer. The secret must not be blank.
    pub fn new(secret: impl Into<String>) -> AppResult<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(AppError::configuration(
                "storage.local.signing_secret must be set",
            ));
        }
        Ok(Self { secret })
    }

    /// Compute the signature for `key` valid until `expires`.
    pub fn signature(&self, key: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b":");
        hasher.update(key.as_bytes());
        hasher.update(b":");
        hasher.update(expires.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Check a presented signature at time `now` (Unix seconds).
    pub fn verify(&self, key: &str, expires: i64, signature: &str, now: i64) -> AppResult<()> {
        if expires < now {
            return Err(AppError::unauthorized("Download link has expired"));
        }
        let expected = self.signature(key, expires);
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(AppError::unauthorized("Invalid download signature"));
        }
        Ok(())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
