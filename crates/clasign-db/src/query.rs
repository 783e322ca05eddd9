//! Deadline-bounded execution of SurrealDB calls.

use std::future::IntoFuture;
use std::time::Duration;

use crate::error::{DbError, classify};

/// Default bound on a single store round-trip.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Await a SurrealDB call under `limit`.
///
/// An elapsed deadline surfaces as [`DbError::Timeout`], never as an
/// empty result that could be read as "not found".
pub(crate) async fn bounded<F, T, E>(limit: Duration, call: F) -> Result<T, DbError>
where
    F: IntoFuture<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(classify),
        Err(_) => Err(DbError::Timeout(limit)),
    }
}

/// Store-side expiry instant for a record kept `ttl` from now.
pub(crate) fn expires_in(ttl: Duration) -> chrono::DateTime<chrono::Utc> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    chrono::Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
}

/// Stable record key for free-form identifiers (purposes, login ids).
pub(crate) fn record_key(raw: &str) -> String {
    use sha2::{Digest, Sha256};

    hex::encode(Sha256::digest(raw.as_bytes()))
}
