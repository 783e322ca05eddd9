//! SurrealDB implementation of [`LinkRepository`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use clasign_core::email::EmailAddr;
use clasign_core::error::{ClaError, ClaResult};
use clasign_core::models::link::{CreateLink, Link};
use clasign_core::repository::LinkRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, classify};
use crate::query::{DEFAULT_QUERY_TIMEOUT, bounded};

#[derive(Debug, SurrealValue)]
struct LinkRow {
    org: String,
    email_sender: String,
    submitter: String,
    clas: serde_json::Value,
    cla_num: u64,
    version: u64,
    created_at: DateTime<Utc>,
}

impl LinkRow {
    fn into_link(self, id: &str) -> Result<Link, DbError> {
        let email_sender = EmailAddr::parse(&self.email_sender)
            .map_err(|e| DbError::decode("link email sender", e))?;
        let clas = serde_json::from_value(self.clas).map_err(|e| DbError::decode("link clas", e))?;
        Ok(Link {
            id: id.to_string(),
            org: self.org,
            email_sender,
            submitter: self.submitter,
            clas,
            cla_num: self.cla_num,
            version: self.version,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct VersionRow {
    #[allow(dead_code)]
    version: u64,
}

/// SurrealDB implementation of the link repository.
#[derive(Clone)]
pub struct SurrealLinkRepository<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealLinkRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self::with_timeout(db, DEFAULT_QUERY_TIMEOUT)
    }

    pub fn with_timeout(db: Surreal<C>, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

impl<C: Connection> LinkRepository for SurrealLinkRepository<C> {
    async fn create(&self, input: CreateLink) -> ClaResult<Link> {
        let id = Uuid::new_v4().simple().to_string();
        let now = Utc::now();

        bounded(
            self.timeout,
            self.db
                .query(
                    "CREATE type::record('link', $id) SET \
                     org = $org, \
                     email_sender = $email_sender, \
                     submitter = $submitter, \
                     clas = [], \
                     cla_num = 0, \
                     version = 0, \
                     created_at = $created_at",
                )
                .bind(("id", id.clone()))
                .bind(("org", input.org.clone()))
                .bind(("email_sender", input.email_sender.to_string()))
                .bind(("submitter", input.submitter.clone()))
                .bind(("created_at", now)),
        )
        .await?
        .check()
        .map_err(classify)?;

        Ok(Link {
            id,
            org: input.org,
            email_sender: input.email_sender,
            submitter: input.submitter,
            clas: Vec::new(),
            cla_num: 0,
            version: 0,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: &str) -> ClaResult<Link> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query("SELECT * FROM type::record('link', $id)")
                .bind(("id", id.to_string())),
        )
        .await?;

        let rows: Vec<LinkRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("link", id))?;

        row.into_link(id).map_err(Into::into)
    }

    async fn save_clas(&self, link: &Link) -> ClaResult<()> {
        let clas = serde_json::to_value(&link.clas).map_err(ClaError::from)?;

        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "UPDATE type::record('link', $id) SET \
                     clas = $clas, cla_num = $cla_num, version += 1 \
                     WHERE version = $version RETURN version",
                )
                .bind(("id", link.id.clone()))
                .bind(("version", link.version))
                .bind(("clas", clas))
                .bind(("cla_num", link.cla_num)),
        )
        .await?
        .check()
        .map_err(classify)?;

        let rows: Vec<VersionRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::stale("link", &link.id).into());
        }
        Ok(())
    }

    async fn delete(&self, link: &Link) -> ClaResult<()> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "DELETE type::record('link', $id) \
                     WHERE version = $version RETURN BEFORE",
                )
                .bind(("id", link.id.clone()))
                .bind(("version", link.version)),
        )
        .await?
        .check()
        .map_err(classify)?;

        let rows: Vec<VersionRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::stale("link", &link.id).into());
        }
        Ok(())
    }
}
