//! Links: an organization's CLAs and sender identity.

use clasign_core::config::SigningConfig;
use clasign_core::error::{ClaResult, ErrorCode};
use clasign_core::models::link::{Cla, CreateLink, Link};
use clasign_core::repository::{CorpSigningRepository, LinkRepository};
use tracing::info;

use crate::retry::retry_on_conflict;

#[derive(Clone)]
pub struct LinkService<L: LinkRepository, C: CorpSigningRepository> {
    repo: L,
    signings: C,
    config: SigningConfig,
}

impl<L: LinkRepository, C: CorpSigningRepository> LinkService<L, C> {
    pub fn new(repo: L, signings: C, config: SigningConfig) -> Self {
        Self {
            repo,
            signings,
            config,
        }
    }

    pub async fn create(&self, input: CreateLink) -> ClaResult<Link> {
        let link = self.repo.create(input).await?;
        info!(link_id = %link.id, org = %link.org, "Link created");
        Ok(link)
    }

    pub async fn find(&self, id: &str) -> ClaResult<Link> {
        self.repo.get_by_id(id).await
    }

    /// Attach a CLA; its id is `cla_<n>` from the link's counter.
    pub async fn add_cla(&self, link_id: &str, cla: Cla) -> ClaResult<Cla> {
        let repo = &self.repo;
        let cla = &cla;
        retry_on_conflict(self.config.max_cas_attempts, || async move {
            let mut link = repo.get_by_id(link_id).await?;
            let added = link.add_cla(cla.clone()).clone();
            repo.save_clas(&link).await?;
            Ok(added)
        })
        .await
    }

    /// Remove a link no corporation has signed. Signings are checked after
    /// each read of the link.
    pub async fn remove(&self, link_id: &str) -> ClaResult<()> {
        let repo = &self.repo;
        let signings = &self.signings;
        retry_on_conflict(self.config.max_cas_attempts, || async move {
            let link = repo.get_by_id(link_id).await?;
            if signings.has_signed_link(link_id).await? {
                return Err(ErrorCode::LinkCanNotRemove.into());
            }
            repo.delete(&link).await
        })
        .await?;

        info!(link_id = %link_id, "Link removed");
        Ok(())
    }
}
