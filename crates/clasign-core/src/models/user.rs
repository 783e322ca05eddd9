//! Manager login accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::email::EmailAddr;
use crate::models::manager::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub link_id: String,
    pub corp_signing_id: String,
    /// `<manager id>_<email domain>`.
    pub account: String,
    pub email: EmailAddr,
    pub role: Role,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub link_id: String,
    pub corp_signing_id: String,
    pub account: String,
    pub email: EmailAddr,
    pub role: Role,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
}
