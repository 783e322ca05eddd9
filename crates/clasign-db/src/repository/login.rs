//! SurrealDB implementation of [`LoginRepository`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use clasign_core::error::ClaResult;
use clasign_core::models::login::Login;
use clasign_core::repository::LoginRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::{DbError, classify};
use crate::query::{DEFAULT_QUERY_TIMEOUT, bounded, expires_in, record_key};

#[derive(Debug, SurrealValue)]
struct LoginRow {
    account: String,
    failed_num: u32,
    frozen_until: Option<DateTime<Utc>>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the login failure repository.
#[derive(Clone)]
pub struct SurrealLoginRepository<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealLoginRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self::with_timeout(db, DEFAULT_QUERY_TIMEOUT)
    }

    pub fn with_timeout(db: Surreal<C>, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

impl<C: Connection> LoginRepository for SurrealLoginRepository<C> {
    async fn save(&self, login: &Login, ttl: Duration) -> ClaResult<()> {
        bounded(
            self.timeout,
            self.db
                .query(
                    "UPSERT type::record('login', $id) SET \
                     account = $account, \
                     failed_num = $failed_num, \
                     frozen_until = $frozen_until, \
                     expires_at = $expires_at",
                )
                .bind(("id", record_key(&login.id)))
                .bind(("account", login.id.clone()))
                .bind(("failed_num", login.failed_num))
                .bind(("frozen_until", login.frozen_until))
                .bind(("expires_at", expires_in(ttl))),
        )
        .await?
        .check()
        .map_err(classify)?;

        Ok(())
    }

    async fn find(&self, id: &str) -> ClaResult<Login> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "SELECT account, failed_num, frozen_until \
                     FROM type::record('login', $id) \
                     WHERE expires_at > $now",
                )
                .bind(("id", record_key(id)))
                .bind(("now", Utc::now())),
        )
        .await?;

        let rows: Vec<LoginRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("login", id))?;

        Ok(Login {
            id: row.account,
            failed_num: row.failed_num,
            frozen_until: row.frozen_until,
        })
    }

    async fn delete(&self, id: &str) -> ClaResult<()> {
        bounded(
            self.timeout,
            self.db
                .query("DELETE type::record('login', $id)")
                .bind(("id", record_key(id))),
        )
        .await?
        .check()
        .map_err(classify)?;

        Ok(())
    }

    async fn purge_expired(&self) -> ClaResult<u64> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "SELECT count() AS total FROM login \
                     WHERE expires_at <= $now GROUP ALL; \
                     DELETE login WHERE expires_at <= $now;",
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
