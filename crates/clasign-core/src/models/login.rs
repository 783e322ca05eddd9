//! Consecutive failed-login tracking for one account.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    /// Account or email the attempts were made with.
    pub id: String,
    pub failed_num: u32,
    pub frozen_until: Option<DateTime<Utc>>,
}

impl Login {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            failed_num: 0,
            frozen_until: None,
        }
    }

    pub fn is_frozen_at(&self, now: DateTime<Utc>) -> bool {
        self.frozen_until.is_some_and(|until| until > now)
    }

    /// Record one failure. Returns `true` when this failure freezes the
    /// account for `cool_down`.
    pub fn fail(&mut self, max_failures: u32, cool_down: Duration, now: DateTime<Utc>) -> bool {
        // A cool-down that has elapsed starts a fresh window.
        if self.frozen_until.is_some_and(|until| until <= now) {
            self.failed_num = 0;
            self.frozen_until = None;
        }

        self.failed_num += 1;
        if self.failed_num >= max_failures {
            self.frozen_until = Some(now + cool_down);
            return true;
        }
        false
    }
}
