//! Corporation admin assignment.

use clasign_core::config::SigningConfig;
use clasign_core::error::ClaResult;
use clasign_core::models::manager::Role;
use clasign_core::repository::{CorpSigningRepository, UserRepository};
use tracing::info;

use crate::accounts::{create_account, drop_accounts, load};
use crate::dto::ManagerAccount;
use crate::retry::retry_on_conflict;

#[derive(Clone)]
pub struct CorpAdminService<C: CorpSigningRepository, U: UserRepository> {
    repo: C,
    users: U,
    config: SigningConfig,
}

impl<C: CorpSigningRepository, U: UserRepository> CorpAdminService<C, U> {
    pub fn new(repo: C, users: U, config: SigningConfig) -> Self {
        Self {
            repo,
            users,
            config,
        }
    }

    /// Make the signer the corporation's admin and open its account.
    ///
    /// Requires the signed PDF; an admin is set only once. The account is
    /// created before the admin is written so a clash on the account name
    /// leaves the signing untouched; a failed write drops the account again.
    pub async fn add(&self, cs_id: &str) -> ClaResult<ManagerAccount> {
        let repo = &self.repo;
        let users = &self.users;
        let account = retry_on_conflict(self.config.max_cas_attempts, || async move {
            let mut cs = load(repo, cs_id).await?;
            cs.can_set_admin()?;

            let seq = repo
                .count_admins_by_domain(&cs.link.link_id, cs.primary_email_domain())
                .await?;
            let admin = cs.set_admin(seq)?.clone();

            let account = create_account(users, &cs, &admin, Role::Admin).await?;
            if let Err(e) = repo.add_admin(&cs).await {
                drop_accounts(users, &cs, &[account.account]).await;
                return Err(e);
            }
            Ok(account)
        })
        .await?;

        info!(corp_signing_id = %cs_id, account = %account.account, "Corporation admin added");
        Ok(account)
    }
}
