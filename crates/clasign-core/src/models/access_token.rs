//! Opaque session credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the caller holds: the opaque id (cookie) and the CSRF secret
/// (header), base64-encoded. Both must be presented together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenKey {
    pub id: String,
    pub csrf: String,
}

/// The record stored, encrypted as a whole, under [`AccessTokenKey::id`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub expiry: DateTime<Utc>,
    pub payload: Vec<u8>,
    pub csrf: Vec<u8>,
}

impl AccessToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry >= now
    }
}
