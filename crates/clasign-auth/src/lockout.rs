//! Login lockout: consecutive failures freeze an account for a while.

use std::time::Duration;

use chrono::Utc;
use clasign_core::error::ClaResult;
use clasign_core::models::login::Login;
use clasign_core::repository::LoginRepository;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;

#[derive(Clone)]
pub struct LoginLockoutService<R: LoginRepository> {
    repo: R,
    max_failures: u32,
    cool_down: Duration,
}

impl<R: LoginRepository> LoginLockoutService<R> {
    pub fn new(repo: R, config: &AuthConfig) -> Self {
        Self {
            repo,
            max_failures: config.max_failed_login_attempts,
            cool_down: Duration::from_secs(config.lockout_duration_secs),
        }
    }

    async fn load(&self, id: &str) -> ClaResult<Login> {
        match self.repo.find(id).await {
            Ok(login) => Ok(login),
            Err(e) if e.is_not_found() => Ok(Login::new(id)),
            Err(e) => Err(e),
        }
    }

    /// Fail with `UserFrozen` while the account's cool-down runs.
    pub async fn check(&self, id: &str) -> ClaResult<()> {
        if self.load(id).await?.is_frozen_at(Utc::now()) {
            return Err(AuthError::AccountFrozen.into());
        }
        Ok(())
    }

    /// Record a failed attempt; returns whether the account is now frozen.
    pub async fn fail(&self, id: &str) -> ClaResult<bool> {
        let mut login = self.load(id).await?;
        let cool_down = chrono::Duration::from_std(self.cool_down)
            .unwrap_or(chrono::Duration::seconds(300));
        let frozen = login.fail(self.max_failures, cool_down, Utc::now());

        // The record outlives the freeze; an idle counter lapses with it.
        self.repo.save(&login, self.cool_down).await?;

        if frozen {
            info!(login = %id, failures = login.failed_num, "Account frozen");
        }
        Ok(frozen)
    }

    /// Reset after a successful login. Best effort.
    pub async fn clear(&self, id: &str) {
        if let Err(e) = self.repo.delete(id).await {
            warn!(login = %id, error = %e, "Failed to clear login failures");
        }
    }
}
