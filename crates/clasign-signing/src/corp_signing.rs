//! Corporation signing: verified signing, lookup, removal.

use clasign_auth::VerificationCodeService;
use clasign_core::config::SigningConfig;
use clasign_core::email::EmailAddr;
use clasign_core::error::{ClaError, ClaResult, ErrorCode};
use clasign_core::models::corp_signing::{CorpSigning, CorpSummary, CreateCorpSigning, LinkInfo};
use clasign_core::models::link::ClaType;
use clasign_core::purpose::Purpose;
use clasign_core::repository::{CorpSigningRepository, LinkRepository, VerificationCodeRepository};
use tracing::info;

use crate::accounts::load;
use crate::dto::SignCorpCla;
use crate::retry::retry_on_conflict;

#[derive(Clone)]
pub struct CorpSigningService<C, L, V>
where
    C: CorpSigningRepository,
    L: LinkRepository,
    V: VerificationCodeRepository,
{
    repo: C,
    links: L,
    codes: VerificationCodeService<V>,
    config: SigningConfig,
}

impl<C, L, V> CorpSigningService<C, L, V>
where
    C: CorpSigningRepository,
    L: LinkRepository,
    V: VerificationCodeRepository,
{
    pub fn new(repo: C, links: L, codes: VerificationCodeService<V>, config: SigningConfig) -> Self {
        Self {
            repo,
            links,
            codes,
            config,
        }
    }

    fn check_domain(&self, email: &EmailAddr) -> ClaResult<()> {
        if !self.config.is_allowed_corp_domain(email.domain()) {
            return Err(ErrorCode::CorpEmailDomainNotAllowed.into());
        }
        Ok(())
    }

    /// Send-side half of signing: a code proving control of `email`.
    pub async fn verification_code(&self, link_id: &str, email: &EmailAddr) -> ClaResult<String> {
        self.check_domain(email)?;
        self.codes
            .new_code_if_allowed(&Purpose::signing(link_id, email))
            .await
    }

    pub async fn sign(&self, link_id: &str, input: SignCorpCla) -> ClaResult<CorpSigning> {
        let email = &input.representative.email;
        self.check_domain(email)?;
        self.codes
            .verify(&input.code, &Purpose::signing(link_id, email))
            .await?;

        let link = self.links.get_by_id(link_id).await?;
        let signs_corp_cla = link
            .clas
            .iter()
            .any(|c| c.id == input.cla_id && c.cla_type == ClaType::Corporation);
        if !signs_corp_cla {
            return Err(ClaError::NotFound {
                entity: "corporation cla".into(),
                id: input.cla_id,
            });
        }

        let cs = self
            .repo
            .add(CreateCorpSigning {
                link: LinkInfo {
                    link_id: link_id.to_string(),
                    cla_id: input.cla_id,
                    language: input.language,
                },
                representative: input.representative,
                corporation_name: input.corporation_name,
                info: input.info,
            })
            .await
            .map_err(|e| {
                if e.is(ErrorCode::DuplicateCreating) {
                    ErrorCode::CorpSigningReSigning.into()
                } else {
                    e
                }
            })?;

        info!(
            corp_signing_id = %cs.id,
            link_id = %link_id,
            corporation = %cs.corporation.name,
            "Corporation signed"
        );
        Ok(cs)
    }

    pub async fn find(&self, id: &str) -> ClaResult<CorpSigning> {
        load(&self.repo, id).await
    }

    pub async fn list(&self, link_id: &str) -> ClaResult<Vec<CorpSigning>> {
        self.repo.list_by_link(link_id).await
    }

    /// Signings of the link an employee with `email` could sign under:
    /// those recognizing its domain that already have a manager.
    pub async fn find_corp_summary(
        &self,
        link_id: &str,
        email: &EmailAddr,
    ) -> ClaResult<Vec<CorpSummary>> {
        let summaries = self.repo.find_corp_summary(link_id, email.domain()).await?;
        Ok(summaries.into_iter().filter(|s| s.has_manager).collect())
    }

    /// Remove a signing that nothing references yet.
    pub async fn remove(&self, id: &str) -> ClaResult<()> {
        let repo = &self.repo;
        retry_on_conflict(self.config.max_cas_attempts, || async move {
            let cs = load(repo, id).await?;
            cs.can_remove()?;
            repo.remove(&cs).await
        })
        .await?;

        info!(corp_signing_id = %id, "Corporation signing removed");
        Ok(())
    }
}
