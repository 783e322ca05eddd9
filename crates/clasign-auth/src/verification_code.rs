//! Purpose-bound verification codes.
//!
//! A code proves control of an email address for exactly one action: the
//! purpose string names the action and every value it applies to, and a
//! code only verifies against the purpose it was issued for. Verifying does
//! not consume the code; the gated action changes the state it checks.

use std::time::Duration;

use chrono::{DateTime, Utc};
use clasign_core::error::{ClaError, ClaResult};
use clasign_core::models::verification_code::VerificationCode;
use clasign_core::purpose::Purpose;
use clasign_core::repository::VerificationCodeRepository;
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::random;

#[derive(Clone)]
pub struct VerificationCodeService<R: VerificationCodeRepository> {
    repo: R,
    lifetime: Duration,
    interval: Duration,
    code_len: usize,
}

impl<R: VerificationCodeRepository> VerificationCodeService<R> {
    pub fn new(repo: R, config: &AuthConfig) -> Self {
        Self {
            repo,
            lifetime: Duration::from_secs(config.verification_code_lifetime_secs),
            interval: Duration::from_secs(config.verification_code_interval_secs),
            code_len: config.verification_code_len,
        }
    }

    /// Issue a code for `purpose`, replacing any earlier one.
    pub async fn new_code(&self, purpose: &Purpose) -> ClaResult<String> {
        let now = Utc::now();
        let expiry = shift(now, self.lifetime, "verification code lifetime")?;
        let code = random::numeric_code(self.code_len);
        let record = VerificationCode {
            code: code.clone(),
            purpose: purpose.clone(),
            expiry,
            created_at: now,
        };
        self.repo.add(&record).await?;

        debug!(purpose = %purpose, "Verification code issued");
        Ok(code)
    }

    /// Like [`new_code`](Self::new_code), but refuse while the previous code
    /// for the same purpose is younger than the configured interval.
    pub async fn new_code_if_allowed(&self, purpose: &Purpose) -> ClaResult<String> {
        if let Some(prev) = self.repo.find_by_purpose(purpose).await? {
            let next_allowed = shift(prev.created_at, self.interval, "verification code interval")?;
            if Utc::now() < next_allowed {
                return Err(AuthError::CodeBusy.into());
            }
        }
        self.new_code(purpose).await
    }

    pub async fn verify(&self, code: &str, purpose: &Purpose) -> ClaResult<()> {
        if code.len() != self.code_len || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::WrongCode.into());
        }

        let record = self.repo.find(code, purpose).await.map_err(|e| {
            if e.is_not_found() {
                AuthError::WrongCode.into()
            } else {
                e
            }
        })?;

        if record.is_expired_at(Utc::now()) {
            return Err(AuthError::WrongCode.into());
        }
        Ok(())
    }
}

fn shift(from: DateTime<Utc>, by: Duration, what: &str) -> ClaResult<DateTime<Utc>> {
    chrono::Duration::from_std(by)
        .ok()
        .and_then(|d| from.checked_add_signed(d))
        .ok_or_else(|| ClaError::Config(format!("{what} out of range: {}s", by.as_secs())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_rejects_out_of_range() {
        let now = Utc::now();
        let err = shift(now, Duration::from_secs(u64::MAX), "lifetime").unwrap_err();
        assert!(matches!(err, ClaError::Config(_)));

        let err = shift(now, Duration::from_secs(i64::MAX as u64 / 1000), "lifetime").unwrap_err();
        assert!(matches!(err, ClaError::Config(_)));

        assert_eq!(
            shift(now, Duration::from_secs(300), "lifetime").unwrap(),
            now + chrono::Duration::seconds(300)
        );
    }
}
