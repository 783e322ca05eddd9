//! Access token service: issue, validate-and-rotate, revoke.
//!
//! The whole token record (expiry, payload, CSRF secret) is sealed with the
//! symmetric encryption service before it reaches the store, so the store
//! only ever sees ciphertext keyed by an opaque id. Callers hold the id
//! (cookie) and the CSRF secret (header) separately.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use clasign_core::error::{ClaError, ClaResult};
use clasign_core::models::access_token::{AccessToken, AccessTokenKey};
use clasign_core::repository::AccessTokenRepository;
use subtle::ConstantTimeEq;
use tracing::{debug, error, warn};

use crate::config::AuthConfig;
use crate::encryption::SymmetricEncryption;
use crate::error::AuthError;
use crate::random;

#[derive(Clone)]
pub struct AccessTokenService<R: AccessTokenRepository, E: SymmetricEncryption> {
    repo: R,
    encryption: E,
    lifetime: Duration,
    grace: Duration,
    csrf_len: usize,
}

impl<R: AccessTokenRepository, E: SymmetricEncryption> AccessTokenService<R, E> {
    pub fn new(repo: R, encryption: E, config: &AuthConfig) -> Self {
        Self {
            repo,
            encryption,
            lifetime: Duration::from_secs(config.access_token_lifetime_secs),
            grace: Duration::from_secs(config.access_token_grace_secs),
            csrf_len: config.csrf_token_len,
        }
    }

    /// Issue a token carrying `payload`.
    pub async fn add(&self, payload: Vec<u8>) -> ClaResult<AccessTokenKey> {
        let csrf = random::random_bytes(self.csrf_len);
        let expiry = Utc::now()
            + chrono::Duration::from_std(self.lifetime)
                .map_err(|e| ClaError::Config(format!("access token lifetime: {e}")))?;

        let token = AccessToken {
            expiry,
            payload,
            csrf: csrf.clone(),
        };
        let sealed = self.encryption.encrypt(&serde_json::to_vec(&token)?)?;
        let id = self.repo.add(sealed, self.lifetime).await?;

        Ok(AccessTokenKey {
            id,
            csrf: STANDARD.encode(csrf),
        })
    }

    /// Check `key` and return the payload without rotating.
    pub async fn validate(&self, key: &AccessTokenKey) -> ClaResult<Vec<u8>> {
        let sealed = self.repo.find(&key.id).await.map_err(|e| {
            if e.is_not_found() {
                AuthError::TokenInvalid("unknown token".into()).into()
            } else {
                e
            }
        })?;

        // A record we can not open was sealed under another key; to the
        // caller it is just not a valid token.
        let plain = self.encryption.decrypt(&sealed).map_err(|e| {
            warn!(token_id = %key.id, error = %e, "Failed to open access token");
            AuthError::TokenInvalid("unreadable token".into())
        })?;
        let token: AccessToken = serde_json::from_slice(&plain)
            .map_err(|_| AuthError::TokenInvalid("malformed token".into()))?;

        let presented = STANDARD
            .decode(&key.csrf)
            .map_err(|_| AuthError::TokenInvalid("malformed csrf".into()))?;
        if !bool::from(presented.ct_eq(&token.csrf)) {
            return Err(AuthError::TokenInvalid("csrf mismatch".into()).into());
        }

        if !token.is_valid_at(Utc::now()) {
            return Err(AuthError::TokenInvalid("expired".into()).into());
        }

        Ok(token.payload)
    }

    /// Validate `old` and rotate it.
    ///
    /// The new token is written before the old one is scheduled to expire,
    /// and the old one stays readable for the grace period so requests in
    /// flight with it still pass. When the new token can not be issued the
    /// old key is handed back and stays valid.
    pub async fn validate_and_refresh(
        &self,
        old: &AccessTokenKey,
    ) -> ClaResult<(AccessTokenKey, Vec<u8>)> {
        let payload = self.validate(old).await?;

        let new_key = match self.add(payload.clone()).await {
            Ok(k) => k,
            Err(e) => {
                warn!(token_id = %old.id, error = %e, "Token rotation failed, keeping old token");
                return Ok((old.clone(), payload));
            }
        };

        if let Err(e) = self.repo.expire(&old.id, self.grace).await {
            error!(token_id = %old.id, error = %e, "Failed to expire rotated token");
        }
        debug!(old = %old.id, new = %new_key.id, "Access token rotated");

        Ok((new_key, payload))
    }

    /// Logout. Best effort: the record lapses on its own anyway.
    pub async fn remove(&self, id: &str) {
        if let Err(e) = self.repo.expire(id, Duration::ZERO).await {
            error!(token_id = %id, error = %e, "Failed to expire access token");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::DateTime;
    use clasign_core::error::ErrorCode;

    use super::*;
    use crate::encryption::AesGcmEncryption;

    /// In-memory store with switchable write failures.
    #[derive(Clone, Default)]
    struct MemStore {
        records: Arc<Mutex<HashMap<String, (Vec<u8>, DateTime<Utc>)>>>,
        fail_writes: Arc<Mutex<bool>>,
        next: Arc<Mutex<u32>>,
    }

    impl AccessTokenRepository for MemStore {
        async fn add(&self, sealed: Vec<u8>, ttl: Duration) -> ClaResult<String> {
            if *self.fail_writes.lock().unwrap() {
                return Err(ClaError::Database("store down".into()));
            }
            let mut next = self.next.lock().unwrap();
            *next += 1;
            let id = format!("t{next}");
            let until = Utc::now() + chrono::Duration::from_std(ttl).unwrap();
            self.records.lock().unwrap().insert(id.clone(), (sealed, until));
            Ok(id)
        }

        async fn find(&self, id: &str) -> ClaResult<Vec<u8>> {
            match self.records.lock().unwrap().get(id) {
                Some((sealed, until)) if *until > Utc::now() => Ok(sealed.clone()),
                _ => Err(ClaError::NotFound {
                    entity: "access_token".into(),
                    id: id.into(),
                }),
            }
        }

        async fn expire(&self, id: &str, ttl: Duration) -> ClaResult<()> {
            let until = Utc::now() + chrono::Duration::from_std(ttl).unwrap();
            if let Some(rec) = self.records.lock().unwrap().get_mut(id) {
                rec.1 = rec.1.min(until);
            }
            Ok(())
        }

        async fn purge_expired(&self) -> ClaResult<u64> {
            Ok(0)
        }
    }

    fn service(store: MemStore, lifetime_secs: u64) -> AccessTokenService<MemStore, AesGcmEncryption> {
        let config = AuthConfig {
            access_token_lifetime_secs: lifetime_secs,
            access_token_grace_secs: 0,
            ..AuthConfig::default()
        };
        AccessTokenService::new(store, AesGcmEncryption::new(&[9u8; 32]), &config)
    }

    #[tokio::test]
    async fn rotation_falls_back_to_old_key_when_store_rejects_new() {
        let store = MemStore::default();
        let svc = service(store.clone(), 3600);
        let key = svc.add(b"p".to_vec()).await.unwrap();

        *store.fail_writes.lock().unwrap() = true;
        let (returned, payload) = svc.validate_and_refresh(&key).await.unwrap();
        assert_eq!(returned, key);
        assert_eq!(payload, b"p");
        assert!(svc.validate(&key).await.is_ok());
    }

    #[tokio::test]
    async fn expired_record_is_invalid() {
        let svc = service(MemStore::default(), 0);
        let key = svc.add(b"p".to_vec()).await.unwrap();
        let err = svc.validate(&key).await.unwrap_err();
        assert!(err.is(ErrorCode::AccessTokenInvalid));
    }

    #[tokio::test]
    async fn infrastructure_failure_is_not_invalid_token() {
        let store = MemStore::default();
        let svc = service(store.clone(), 3600);
        *store.fail_writes.lock().unwrap() = true;
        let err = svc.add(b"p".to_vec()).await.unwrap_err();
        assert_eq!(err.code(), None);
    }
}
