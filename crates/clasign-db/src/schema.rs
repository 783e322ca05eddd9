//! Schema definitions and migration runner for SurrealDB.
//!
//! Flat records use SCHEMAFULL tables. The corporation signing and link
//! aggregates hold nested arrays of objects, so their tables are
//! SCHEMALESS with typed top-level fields. Every versioned aggregate has
//! an integer `version` that writes compare and increment; expiring
//! records carry `expires_at`, which reads filter on and the sweeper
//! purges by.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};

use crate::error::DbError;

/// Forward-only schema steps, oldest first. A database records the
/// highest step it has applied in `schema_version`.
const STEPS: &[(u32, &str)] = &[(1, SCHEMA_V1)];

const VERSION_TABLE: &str = "\
DEFINE TABLE IF NOT EXISTS schema_version SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE schema_version TYPE int;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE schema_version TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_schema_version ON TABLE schema_version \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct VersionRow {
    version: u32,
}

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Links
-- =======================================================================
DEFINE TABLE link SCHEMALESS;
DEFINE FIELD org ON TABLE link TYPE string;
DEFINE FIELD email_sender ON TABLE link TYPE string;
DEFINE FIELD submitter ON TABLE link TYPE string;
DEFINE FIELD clas ON TABLE link TYPE array DEFAULT [];
DEFINE FIELD cla_num ON TABLE link TYPE int DEFAULT 0;
DEFINE FIELD version ON TABLE link TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE link TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Corporation signings
-- =======================================================================
DEFINE TABLE corp_signing SCHEMALESS;
DEFINE FIELD version ON TABLE corp_signing TYPE int DEFAULT 0;
DEFINE FIELD date ON TABLE corp_signing TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD link_id ON TABLE corp_signing TYPE string;
DEFINE FIELD cla_id ON TABLE corp_signing TYPE string;
DEFINE FIELD lang ON TABLE corp_signing TYPE string;
DEFINE FIELD rep_name ON TABLE corp_signing TYPE string;
DEFINE FIELD rep_email ON TABLE corp_signing TYPE string;
DEFINE FIELD corp_name ON TABLE corp_signing TYPE string;
DEFINE FIELD corp_domain ON TABLE corp_signing TYPE string;
DEFINE FIELD corp_domains ON TABLE corp_signing TYPE array<string> \
    DEFAULT [];
DEFINE FIELD managers ON TABLE corp_signing TYPE array DEFAULT [];
DEFINE FIELD employees ON TABLE corp_signing TYPE array DEFAULT [];
DEFINE FIELD deleted ON TABLE corp_signing TYPE array DEFAULT [];
DEFINE FIELD has_pdf ON TABLE corp_signing TYPE bool DEFAULT false;
DEFINE FIELD pdf ON TABLE corp_signing TYPE option<string>;
DEFINE FIELD triggered ON TABLE corp_signing TYPE bool DEFAULT false;
DEFINE INDEX idx_corp_signing_link ON TABLE corp_signing \
    COLUMNS link_id;
DEFINE INDEX idx_corp_signing_link_rep ON TABLE corp_signing \
    COLUMNS link_id, rep_email UNIQUE;
DEFINE INDEX idx_corp_signing_link_corp ON TABLE corp_signing \
    COLUMNS link_id, corp_name, corp_domain UNIQUE;

-- Removed signings, kept for audit.
DEFINE TABLE corp_signing_archive SCHEMAFULL;
DEFINE FIELD link_id ON TABLE corp_signing_archive TYPE string;
DEFINE FIELD snapshot ON TABLE corp_signing_archive TYPE object \
    FLEXIBLE;
DEFINE FIELD removed_at ON TABLE corp_signing_archive TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Access tokens (sealed records)
-- =======================================================================
DEFINE TABLE access_token SCHEMAFULL;
DEFINE FIELD sealed ON TABLE access_token TYPE string;
DEFINE FIELD expires_at ON TABLE access_token TYPE datetime;
DEFINE FIELD created_at ON TABLE access_token TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_access_token_expires ON TABLE access_token \
    COLUMNS expires_at;

-- =======================================================================
-- Verification codes, one record per purpose
-- =======================================================================
DEFINE TABLE verification_code SCHEMAFULL;
DEFINE FIELD code ON TABLE verification_code TYPE string;
DEFINE FIELD purpose ON TABLE verification_code TYPE string;
DEFINE FIELD expires_at ON TABLE verification_code TYPE datetime;
DEFINE FIELD created_at ON TABLE verification_code TYPE datetime;
DEFINE INDEX idx_verification_code_expires ON TABLE verification_code \
    COLUMNS expires_at;

-- =======================================================================
-- Login failure records
-- =======================================================================
DEFINE TABLE login SCHEMAFULL;
DEFINE FIELD account ON TABLE login TYPE string;
DEFINE FIELD failed_num ON TABLE login TYPE int DEFAULT 0;
DEFINE FIELD frozen_until ON TABLE login TYPE option<datetime>;
DEFINE FIELD expires_at ON TABLE login TYPE datetime;
DEFINE INDEX idx_login_expires ON TABLE login COLUMNS expires_at;

-- =======================================================================
-- Corporation accounts (admin and managers)
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD link_id ON TABLE user TYPE string;
DEFINE FIELD corp_signing_id ON TABLE user TYPE string;
DEFINE FIELD account ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['admin', 'manager'];
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_link_account ON TABLE user \
    COLUMNS link_id, account UNIQUE;
DEFINE INDEX idx_user_link_email ON TABLE user \
    COLUMNS link_id, email;

-- =======================================================================
-- Email sender credentials
-- =======================================================================
DEFINE TABLE email_credential SCHEMAFULL;
DEFINE FIELD addr ON TABLE email_credential TYPE string;
DEFINE FIELD token ON TABLE email_credential TYPE string;
DEFINE FIELD platform ON TABLE email_credential TYPE string;
DEFINE FIELD updated_at ON TABLE email_credential TYPE datetime \
    DEFAULT time::now();
";

/// Bring the database up to the latest schema step.
///
/// Safe to call on every start: steps at or below the recorded version
/// are skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(VERSION_TABLE)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("schema_version table: {e}")))?;

    let current = schema_version(db).await?;
    let mut upgraded = false;

    for &(version, ddl) in STEPS.iter().filter(|(v, _)| *v > current) {
        info!(from = current, to = version, "Upgrading schema");
        db.query(ddl)
            .await?
            .check()
            .map_err(|e| DbError::Migration(format!("step {version}: {e}")))?;

        db.query("CREATE schema_version SET version = $version")
            .bind(("version", version))
            .await?
            .check()
            .map_err(|e| DbError::Migration(format!("recording step {version}: {e}")))?;
        upgraded = true;
    }

    if !upgraded {
        debug!(version = current, "Schema is current");
    }
    Ok(())
}

/// Highest applied step, 0 for a fresh database.
async fn schema_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
        .await?;
    let rows: Vec<VersionRow> = result.take(0)?;
    Ok(rows.first().map_or(0, |r| r.version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_ascend_from_one() {
        assert_eq!(STEPS.first().map(|(v, _)| *v), Some(1));
        assert!(STEPS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn signing_uniqueness_is_enforced_by_index() {
        assert!(SCHEMA_V1.contains("COLUMNS link_id, rep_email UNIQUE"));
        assert!(SCHEMA_V1.contains("COLUMNS link_id, corp_name, corp_domain UNIQUE"));
    }
}
