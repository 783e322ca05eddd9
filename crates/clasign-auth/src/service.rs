//! Manager login: lockout check, password verification, token issuance.

use clasign_core::email::EmailAddr;
use clasign_core::error::{ClaError, ClaResult};
use clasign_core::models::access_token::AccessTokenKey;
use clasign_core::models::manager::Role;
use clasign_core::repository::{AccessTokenRepository, LoginRepository, UserRepository};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::access_token::AccessTokenService;
use crate::config::AuthConfig;
use crate::encryption::SymmetricEncryption;
use crate::error::AuthError;
use crate::lockout::LoginLockoutService;
use crate::password;

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub link_id: String,
    /// Account (`<id>_<domain>`) or email address.
    pub account_or_email: String,
    pub password: String,
}

/// What an access token issued at login carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginClaims {
    pub user_id: Uuid,
    pub link_id: String,
    pub corp_signing_id: String,
    pub role: Role,
    pub email: EmailAddr,
}

impl LoginClaims {
    pub fn to_payload(&self) -> ClaResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_payload(payload: &[u8]) -> ClaResult<Self> {
        serde_json::from_slice(payload)
            .map_err(|_| AuthError::TokenInvalid("payload is not login claims".into()).into())
    }
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    pub key: AccessTokenKey,
    pub claims: LoginClaims,
}

/// Login service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
#[derive(Clone)]
pub struct LoginService<U, L, T, E>
where
    U: UserRepository,
    L: LoginRepository,
    T: AccessTokenRepository,
    E: SymmetricEncryption,
{
    user_repo: U,
    lockout: LoginLockoutService<L>,
    tokens: AccessTokenService<T, E>,
    pepper: Option<String>,
}

impl<U, L, T, E> LoginService<U, L, T, E>
where
    U: UserRepository,
    L: LoginRepository,
    T: AccessTokenRepository,
    E: SymmetricEncryption,
{
    pub fn new(
        user_repo: U,
        lockout: LoginLockoutService<L>,
        tokens: AccessTokenService<T, E>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            lockout,
            tokens,
            pepper: config.pepper.clone(),
        }
    }

    pub async fn login(&self, input: LoginInput) -> ClaResult<LoginOutput> {
        let login_id = format!(
            "{}/{}",
            input.link_id,
            input.account_or_email.trim().to_lowercase()
        );

        // 1. A frozen account is rejected whatever the password.
        self.lockout.check(&login_id).await?;

        // 2. Resolve the account and verify the password.
        let found = if input.account_or_email.contains('@') {
            match EmailAddr::parse(&input.account_or_email) {
                Ok(email) => self.user_repo.get_by_email(&input.link_id, &email).await,
                Err(e) => Err(e),
            }
        } else {
            self.user_repo
                .get_by_account(&input.link_id, input.account_or_email.trim())
                .await
        };

        // Unknown and malformed accounts fail like a wrong password.
        let user = match found {
            Ok(u) => Some(u),
            Err(e) if e.is_not_found() || matches!(e, ClaError::Validation { .. }) => None,
            Err(e) => return Err(e),
        };

        let checked = match &user {
            Some(u) => password::check_password(
                &input.password,
                &u.password_hash,
                self.pepper.as_deref(),
            ),
            None => Err(AuthError::InvalidCredentials),
        };
        let valid = match checked {
            Ok(()) => true,
            Err(AuthError::InvalidCredentials) => false,
            Err(e) => return Err(e.into()),
        };

        let Some(user) = user.filter(|_| valid) else {
            // 3. Count the failure; the attempt that reaches the ceiling
            //    already reports the freeze.
            if self.lockout.fail(&login_id).await? {
                return Err(AuthError::AccountFrozen.into());
            }
            return Err(AuthError::InvalidCredentials.into());
        };

        // 4. Success clears the counter and issues a token.
        self.lockout.clear(&login_id).await;

        let claims = LoginClaims {
            user_id: user.id,
            link_id: user.link_id,
            corp_signing_id: user.corp_signing_id,
            role: user.role,
            email: user.email,
        };
        let key = self.tokens.add(claims.to_payload()?).await?;

        info!(user_id = %claims.user_id, link_id = %claims.link_id, "Manager logged in");
        Ok(LoginOutput { key, claims })
    }

    /// Validate and rotate a login token, returning the new key and claims.
    pub async fn authenticate(&self, key: &AccessTokenKey) -> ClaResult<(AccessTokenKey, LoginClaims)> {
        let (key, payload) = self.tokens.validate_and_refresh(key).await?;
        Ok((key, LoginClaims::from_payload(&payload)?))
    }

    pub async fn logout(&self, key: &AccessTokenKey) {
        self.tokens.remove(&key.id).await;
    }
}
