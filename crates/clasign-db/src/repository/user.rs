//! SurrealDB implementation of [`UserRepository`].
//!
//! Corporation admins and employee managers log in with these accounts.
//! Passwords are stored as Argon2id PHC strings with a fresh salt each,
//! after prepending the server pepper when one is configured.

use std::borrow::Cow;
use std::time::Duration;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use clasign_core::email::EmailAddr;
use clasign_core::error::{ClaError, ClaResult};
use clasign_core::models::manager::Role;
use clasign_core::models::user::{CreateUser, User};
use clasign_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, classify};
use crate::query::{DEFAULT_QUERY_TIMEOUT, bounded};

#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    link_id: String,
    corp_signing_id: String,
    account: String,
    email: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id).map_err(|e| DbError::decode("user id", e))?;
        let email = EmailAddr::parse(&self.email).map_err(|e| DbError::decode("user email", e))?;
        let role = Role::parse(&self.role)
            .ok_or_else(|| DbError::Decode(format!("unknown role: {}", self.role)))?;
        Ok(User {
            id,
            link_id: self.link_id,
            corp_signing_id: self.corp_signing_id,
            account: self.account,
            email,
            role,
            password_hash: self.password_hash,
            created_at: self.created_at,
        })
    }
}

/// PHC string stored for a manager password.
fn seal_password(password: &str, pepper: Option<&str>) -> ClaResult<String> {
    let input: Cow<'_, str> = match pepper {
        Some(p) => Cow::Owned(format!("{p}{password}")),
        None => Cow::Borrowed(password),
    };

    Argon2::default()
        .hash_password(input.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|phc| phc.to_string())
        .map_err(|e| ClaError::Crypto(format!("sealing manager password: {e}")))
}

/// SurrealDB implementation of the corporation account repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
    timeout: Duration,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            db,
            pepper: None,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            pepper: Some(pepper),
            ..Self::new(db)
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn select_where(&self, clause: &str, link_id: &str, value: String) -> ClaResult<User> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(format!(
                    "SELECT meta::id(id) AS record_id, * FROM user \
                     WHERE link_id = $link_id AND {clause} = $lookup LIMIT 1"
                ))
                .bind(("link_id", link_id.to_string()))
                .bind(("lookup", value.clone())),
        )
        .await?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("user", format!("{clause}={value}")))?;

        row.try_into_user().map_err(Into::into)
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> ClaResult<User> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let password_hash = seal_password(&input.password, self.pepper.as_deref())?;

        bounded(
            self.timeout,
            self.db
                .query(
                    "CREATE type::record('user', $id) SET \
                     link_id = $link_id, \
                     corp_signing_id = $corp_signing_id, \
                     account = $account, \
                     email = $email, \
                     role = $role, \
                     password_hash = $password_hash, \
                     created_at = $created_at",
                )
                .bind(("id", id.to_string()))
                .bind(("link_id", input.link_id.clone()))
                .bind(("corp_signing_id", input.corp_signing_id.clone()))
                .bind(("account", input.account.clone()))
                .bind(("email", input.email.to_string()))
                .bind(("role", input.role.as_str()))
                .bind(("password_hash", password_hash.clone()))
                .bind(("created_at", now)),
        )
        .await?
        .check()
        .map_err(classify)?;

        Ok(User {
            id,
            link_id: input.link_id,
            corp_signing_id: input.corp_signing_id,
            account: input.account,
            email: input.email,
            role: input.role,
            password_hash,
            created_at: now,
        })
    }

    async fn get_by_account(&self, link_id: &str, account: &str) -> ClaResult<User> {
        self.select_where("account", link_id, account.to_string())
            .await
    }

    async fn get_by_email(&self, link_id: &str, email: &EmailAddr) -> ClaResult<User> {
        self.select_where("email", link_id, email.to_string()).await
    }

    async fn delete(&self, id: Uuid) -> ClaResult<()> {
        bounded(
            self.timeout,
            self.db
                .query("DELETE type::record('user', $id)")
                .bind(("id", id.to_string())),
        )
        .await?
        .check()
        .map_err(classify)?;

        Ok(())
    }

    async fn delete_by_accounts(&self, link_id: &str, accounts: &[String]) -> ClaResult<()> {
        if accounts.is_empty() {
            return Ok(());
        }

        bounded(
            self.timeout,
            self.db
                .query("DELETE user WHERE link_id = $link_id AND account IN $accounts")
                .bind(("link_id", link_id.to_string()))
                .bind(("accounts", accounts.to_vec())),
        )
        .await?
        .check()
        .map_err(classify)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use argon2::{PasswordHash, PasswordVerifier};

    use super::*;

    #[test]
    fn sealed_password_needs_the_pepper() {
        let phc = seal_password("hunter22", Some("pep-")).unwrap();
        assert!(phc.starts_with("$argon2id$v=19$"));

        let parsed = PasswordHash::new(&phc).unwrap();
        let argon2 = Argon2::default();
        assert!(argon2.verify_password(b"pep-hunter22", &parsed).is_ok());
        assert!(argon2.verify_password(b"hunter22", &parsed).is_err());
        assert_ne!(phc, seal_password("hunter22", Some("pep-")).unwrap());
    }
}
