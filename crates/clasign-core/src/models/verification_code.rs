//! Short-lived, purpose-bound one-time codes.

use chrono::{DateTime, Duration, Utc};

use crate::purpose::Purpose;

#[derive(Debug, Clone)]
pub struct VerificationCode {
    pub code: String,
    pub purpose: Purpose,
    pub expiry: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn new(code: String, purpose: Purpose, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            code,
            purpose,
            expiry: now + lifetime,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry < now
    }
}
