//! SurrealDB implementation of [`AccessTokenRepository`].
//!
//! Records are opaque: the auth layer seals them before they reach the
//! store. The store only knows when a record stops being readable.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use clasign_core::error::ClaResult;
use clasign_core::repository::AccessTokenRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, classify};
use crate::query::{DEFAULT_QUERY_TIMEOUT, bounded, expires_in};

#[derive(Debug, SurrealValue)]
struct SealedRow {
    sealed: String,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the access token repository.
#[derive(Clone)]
pub struct SurrealAccessTokenRepository<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealAccessTokenRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self::with_timeout(db, DEFAULT_QUERY_TIMEOUT)
    }

    pub fn with_timeout(db: Surreal<C>, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

impl<C: Connection> AccessTokenRepository for SurrealAccessTokenRepository<C> {
    async fn add(&self, sealed: Vec<u8>, ttl: Duration) -> ClaResult<String> {
        let id = Uuid::new_v4().to_string();

        bounded(
            self.timeout,
            self.db
                .query(
                    "CREATE type::record('access_token', $id) SET \
                     sealed = $sealed, \
                     expires_at = $expires_at",
                )
                .bind(("id", id.clone()))
                .bind(("sealed", STANDARD.encode(sealed)))
                .bind(("expires_at", expires_in(ttl))),
        )
        .await?
        .check()
        .map_err(classify)?;

        Ok(id)
    }

    async fn find(&self, id: &str) -> ClaResult<Vec<u8>> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "SELECT sealed FROM type::record('access_token', $id) \
                     WHERE expires_at > $now",
                )
                .bind(("id", id.to_string()))
                .bind(("now", Utc::now())),
        )
        .await?;

        let rows: Vec<SealedRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("access_token", id))?;

        STANDARD
            .decode(row.sealed)
            .map_err(|e| DbError::decode("sealed access token", e).into())
    }

    async fn expire(&self, id: &str, ttl: Duration) -> ClaResult<()> {
        // Only ever shortens; a record already closer to expiry is left alone.
        bounded(
            self.timeout,
            self.db
                .query(
                    "UPDATE type::record('access_token', $id) SET \
                     expires_at = $expires_at \
                     WHERE expires_at > $expires_at",
                )
                .bind(("id", id.to_string()))
                .bind(("expires_at", expires_in(ttl))),
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
                    "SELECT count() AS total FROM access_token \
                     WHERE expires_at <= $now GROUP ALL; \
                     DELETE access_token WHERE expires_at <= $now;",
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
