//! Request context carrying the authenticated owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cloudio_core::types::OwnerId;

/// Context for the current authenticated request.
///
/// Built by the API's auth extractor and passed into every service method,
/// so each operation knows whose tree it acts on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated caller; every record touched must belong to them.
    pub owner_id: OwnerId,
    /// When the request was received. Used to stamp `created_at` and
    /// `modified_at`.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context stamped with the current time.
    pub fn new(owner_id: OwnerId) -> Self {
        Self::at(owner_id, Utc::now())
    }

    /// Creates a context with an explicit request time.
    pub fn at(owner_id: OwnerId, request_time: DateTime<Utc>) -> Self {
        Self {
            owner_id,
            request_time,
        }
    }
}
