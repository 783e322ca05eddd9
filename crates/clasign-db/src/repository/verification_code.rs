//! SurrealDB implementation of [`VerificationCodeRepository`].
//!
//! One record per purpose, keyed by a digest of the purpose string, so a
//! new code for the same purpose replaces the previous one.

use std::time::Duration;

use chrono::{DateTime, Utc};
use clasign_core::error::ClaResult;
use clasign_core::models::verification_code::VerificationCode;
use clasign_core::purpose::Purpose;
use clasign_core::repository::VerificationCodeRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::{DbError, classify};
use crate::query::{DEFAULT_QUERY_TIMEOUT, bounded, record_key};

#[derive(Debug, SurrealValue)]
struct CodeRow {
    code: String,
    purpose: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl CodeRow {
    fn try_into_code(self) -> Result<VerificationCode, DbError> {
        let purpose = Purpose::new(self.purpose).map_err(|e| DbError::decode("purpose", e))?;
        Ok(VerificationCode {
            code: self.code,
            purpose,
            expiry: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the verification code repository.
#[derive(Clone)]
pub struct SurrealVerificationCodeRepository<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealVerificationCodeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self::with_timeout(db, DEFAULT_QUERY_TIMEOUT)
    }

    pub fn with_timeout(db: Surreal<C>, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

impl<C: Connection> VerificationCodeRepository for SurrealVerificationCodeRepository<C> {
    async fn add(&self, code: &VerificationCode) -> ClaResult<()> {
        bounded(
            self.timeout,
            self.db
                .query(
                    "UPSERT type::record('verification_code', $id) SET \
                     code = $code, \
                     purpose = $purpose, \
                     expires_at = $expires_at, \
                     created_at = $created_at",
                )
                .bind(("id", record_key(code.purpose.as_str())))
                .bind(("code", code.code.clone()))
                .bind(("purpose", code.purpose.as_str().to_string()))
                .bind(("expires_at", code.expiry))
                .bind(("created_at", code.created_at)),
        )
        .await?
        .check()
        .map_err(classify)?;

        Ok(())
    }

    async fn find(&self, code: &str, purpose: &Purpose) -> ClaResult<VerificationCode> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "SELECT * FROM type::record('verification_code', $id) \
                     WHERE code = $code AND purpose = $purpose",
                )
                .bind(("id", record_key(purpose.as_str())))
                .bind(("code", code.to_string()))
                .bind(("purpose", purpose.as_str().to_string())),
        )
        .await?;

        let rows: Vec<CodeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("verification_code", purpose.as_str()))?;

        row.try_into_code().map_err(Into::into)
    }

    async fn find_by_purpose(&self, purpose: &Purpose) -> ClaResult<Option<VerificationCode>> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query("SELECT * FROM type::record('verification_code', $id)")
                .bind(("id", record_key(purpose.as_str()))),
        )
        .await?;

        let rows: Vec<CodeRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|r| r.try_into_code().map_err(Into::into))
            .transpose()
    }

    async fn purge_expired(&self) -> ClaResult<u64> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "SELECT count() AS total FROM verification_code \
                     WHERE expires_at <= $now GROUP ALL; \
                     DELETE verification_code WHERE expires_at <= $now;",
                )
                .bind(("now", Utc::now())),
        )
        .await?
        .check()
        .map_err(classify)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
