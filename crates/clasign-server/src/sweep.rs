//! Periodic removal of expired tokens, verification codes and login
//! counters. Reads already ignore expired rows; this only reclaims space.

use std::time::Duration;

use clasign_core::repository::{
    AccessTokenRepository, LoginRepository, VerificationCodeRepository,
};
use tracing::{debug, info, warn};

pub struct Sweeper<T, V, L> {
    tokens: T,
    codes: V,
    logins: L,
}

impl<T, V, L> Sweeper<T, V, L>
where
    T: AccessTokenRepository,
    V: VerificationCodeRepository,
    L: LoginRepository,
{
    pub fn new(tokens: T, codes: V, logins: L) -> Self {
        Self {
            tokens,
            codes,
            logins,
        }
    }

    /// One pass over all expiring tables. Returns the number of purged rows;
    /// a failing table is logged and skipped.
    pub async fn sweep_once(&self) -> u64 {
        let results = [
            ("access_token", self.tokens.purge_expired().await),
            ("verification_code", self.codes.purge_expired().await),
            ("login", self.logins.purge_expired().await),
        ];

        let mut total = 0;
        for (table, result) in results {
            match result {
                Ok(n) => {
                    debug!(table, purged = n, "Expired records purged");
                    total += n;
                }
                Err(e) => warn!(table, error = %e, "Failed to purge expired records"),
            }
        }
        total
    }

    /// Sweep every `period` until the future is dropped.
    pub async fn run(self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let purged = self.sweep_once().await;
            if purged > 0 {
                info!(purged, "Sweep finished");
            }
        }
    }
}
