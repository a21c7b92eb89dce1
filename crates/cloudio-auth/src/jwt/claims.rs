//! Claims read from identity provider tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cloudio_core::error::AppError;
use cloudio_core::types::OwnerId;

/// The subset of registered claims Cloudio relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user identifier assigned by the identity provider.
    pub sub: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issued-at timestamp (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    /// The owner identity carried by the subject claim.
    pub fn owner_id(&self) -> Result<OwnerId, AppError> {
        OwnerId::new(self.sub.clone())
            .ok_or_else(|| AppError::unauthorized("Token has an empty subject"))
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}
