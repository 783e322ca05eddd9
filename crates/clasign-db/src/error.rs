//! Database-specific error types and conversions.

use std::time::Duration;

use clasign_core::error::{ClaError, ErrorCode};

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique index violated: {0}")]
    Duplicate(String),

    #[error("Stale version of {entity} {id}")]
    VersionMismatch { entity: String, id: String },

    #[error("Write conflict: {0}")]
    WriteConflict(String),

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid stored data: {0}")]
    Decode(String),
}

impl DbError {
    pub(crate) fn not_found(entity: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub(crate) fn stale(entity: &str, id: impl Into<String>) -> Self {
        Self::VersionMismatch {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub(crate) fn decode(what: &str, err: impl std::fmt::Display) -> Self {
        Self::Decode(format!("{what}: {err}"))
    }
}

/// Classify a failed statement. Unique-index violations and transaction
/// write conflicts get their own variants; everything else is opaque.
pub(crate) fn classify(err: impl std::fmt::Display) -> DbError {
    let msg = err.to_string();
    if msg.contains("already contains") {
        DbError::Duplicate(msg)
    } else if msg.to_ascii_lowercase().contains("conflict") {
        DbError::WriteConflict(msg)
    } else {
        DbError::Query(msg)
    }
}

impl From<DbError> for ClaError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ClaError::NotFound { entity, id },
            DbError::Duplicate(_) => ClaError::Domain(ErrorCode::DuplicateCreating),
            // A write that lost to a concurrent transaction lost the same
            // race as a stale version.
            DbError::VersionMismatch { .. } | DbError::WriteConflict(_) => {
                ClaError::Domain(ErrorCode::ConcurrentUpdating)
            }
            DbError::Timeout(limit) => ClaError::Timeout(limit),
            other => ClaError::Database(other.to_string()),
        }
    }
}
