//! SurrealDB implementation of [`EmailCredentialRepository`].

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clasign_core::email::EmailAddr;
use clasign_core::error::{ClaResult, ErrorCode};
use clasign_core::models::email_credential::EmailCredential;
use clasign_core::repository::EmailCredentialRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::{DbError, classify};
use crate::query::{DEFAULT_QUERY_TIMEOUT, bounded, record_key};

#[derive(Debug, SurrealValue)]
struct CredentialRow {
    token: String,
    platform: String,
}

/// SurrealDB implementation of the email credential repository.
#[derive(Clone)]
pub struct SurrealEmailCredentialRepository<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealEmailCredentialRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self::with_timeout(db, DEFAULT_QUERY_TIMEOUT)
    }

    pub fn with_timeout(db: Surreal<C>, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

impl<C: Connection> EmailCredentialRepository for SurrealEmailCredentialRepository<C> {
    async fn add(&self, credential: &EmailCredential) -> ClaResult<()> {
        bounded(
            self.timeout,
            self.db
                .query(
                    "UPSERT type::record('email_credential', $id) SET \
                     addr = $addr, \
                     token = $sealed_token, \
                     platform = $platform, \
                     updated_at = time::now()",
                )
                .bind(("id", record_key(credential.addr.as_str())))
                .bind(("addr", credential.addr.to_string()))
                .bind(("sealed_token", STANDARD.encode(&credential.token)))
                .bind(("platform", credential.platform.clone())),
        )
        .await?
        .check()
        .map_err(classify)?;

        Ok(())
    }

    async fn find(&self, addr: &EmailAddr) -> ClaResult<EmailCredential> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query("SELECT token, platform FROM type::record('email_credential', $id)")
                .bind(("id", record_key(addr.as_str()))),
        )
        .await?;

        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or(ErrorCode::EmailCredentialNotFound)?;

        let token = STANDARD
            .decode(row.token)
            .map_err(|e| DbError::decode("email credential token", e))?;

        Ok(EmailCredential {
            addr: addr.clone(),
            token,
            platform: row.platform,
        })
    }
}
