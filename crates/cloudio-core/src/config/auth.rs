//! Bearer token verification configuration.

use serde::{Deserialize, Serialize};

/// Settings for verifying the identity provider's session tokens.
///
/// Exactly one of `jwt_secret` (HS256) or `jwt_public_key_pem` (RS256)
/// should be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC secret for HS256 tokens.
    #[serde(default)]
    pub jwt_secret: String,
    /// PEM-encoded RSA public key for RS256 tokens.
    #[serde(default)]
    pub jwt_public_key_pem: String,
    /// Expected `iss` claim, if any.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Allowed clock skew in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_public_key_pem: String::new(),
            issuer: None,
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_leeway() -> u64 {
    5
}
