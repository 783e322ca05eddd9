//! Employee managers: who may approve employee signings.

use clasign_core::config::SigningConfig;
use clasign_core::error::ClaResult;
use clasign_core::models::manager::{Manager, Role};
use clasign_core::repository::{CorpSigningRepository, UserRepository};
use tracing::{info, warn};

use crate::accounts::{create_account, drop_accounts, load};
use crate::dto::ManagerAccount;
use crate::retry::retry_on_conflict;

#[derive(Clone)]
pub struct EmployeeManagerService<C: CorpSigningRepository, U: UserRepository> {
    repo: C,
    users: U,
    config: SigningConfig,
}

impl<C: CorpSigningRepository, U: UserRepository> EmployeeManagerService<C, U> {
    pub fn new(repo: C, users: U, config: SigningConfig) -> Self {
        Self {
            repo,
            users,
            config,
        }
    }

    /// Add `managers` as one batch and open an account for each.
    ///
    /// Accounts are opened first; if any of them or the write fails, the
    /// ones already opened are dropped and nothing is added.
    pub async fn add(&self, cs_id: &str, managers: Vec<Manager>) -> ClaResult<Vec<ManagerAccount>> {
        let repo = &self.repo;
        let users = &self.users;
        let batch = managers.as_slice();
        let max = self.config.max_employee_managers;
        let accounts = retry_on_conflict(self.config.max_cas_attempts, || async move {
            let mut cs = load(repo, cs_id).await?;
            cs.add_managers(batch, max)?;

            let mut accounts = Vec::with_capacity(batch.len());
            for m in batch {
                match create_account(users, &cs, m, Role::Manager).await {
                    Ok(account) => accounts.push(account),
                    Err(e) => {
                        drop_accounts(users, &cs, &names(&accounts)).await;
                        return Err(e);
                    }
                }
            }

            if let Err(e) = repo.add_employee_managers(&cs, batch).await {
                drop_accounts(users, &cs, &names(&accounts)).await;
                return Err(e);
            }
            Ok(accounts)
        })
        .await?;

        info!(corp_signing_id = %cs_id, count = accounts.len(), "Employee managers added");
        Ok(accounts)
    }

    /// Remove managers by id, closing their accounts. Returns the removed
    /// managers.
    pub async fn remove(&self, cs_id: &str, ids: &[String]) -> ClaResult<Vec<Manager>> {
        let repo = &self.repo;
        let max = self.config.max_employee_managers;
        let (cs, removed) = retry_on_conflict(self.config.max_cas_attempts, || async move {
            let mut cs = load(repo, cs_id).await?;
            let removed = cs.remove_managers(ids, max)?;
            repo.remove_employee_managers(&cs, ids).await?;
            Ok((cs, removed))
        })
        .await?;

        let accounts: Vec<String> = removed.iter().map(Manager::account).collect();
        if let Err(e) = self
            .users
            .delete_by_accounts(&cs.link.link_id, &accounts)
            .await
        {
            warn!(corp_signing_id = %cs_id, error = %e, "Failed to delete manager accounts");
        }

        info!(corp_signing_id = %cs_id, count = removed.len(), "Employee managers removed");
        Ok(removed)
    }

    pub async fn list(&self, cs_id: &str) -> ClaResult<Vec<Manager>> {
        self.repo.find_employee_managers(cs_id).await
    }
}

fn names(accounts: &[ManagerAccount]) -> Vec<String> {
    accounts.iter().map(|a| a.account.clone()).collect()
}
