//! Growing a corporation's recognized email domains.
//!
//! A domain is only added by someone who proves control of an address in
//! it, and only when the domain matcher relates it to the primary domain.

use clasign_auth::VerificationCodeService;
use clasign_core::config::SigningConfig;
use clasign_core::email::EmailAddr;
use clasign_core::error::ClaResult;
use clasign_core::purpose::Purpose;
use clasign_core::repository::{CorpSigningRepository, VerificationCodeRepository};
use tracing::info;

use crate::accounts::load;
use crate::retry::retry_on_conflict;

#[derive(Clone)]
pub struct CorpEmailDomainService<C, V>
where
    C: CorpSigningRepository,
    V: VerificationCodeRepository,
{
    repo: C,
    codes: VerificationCodeService<V>,
    config: SigningConfig,
}

impl<C, V> CorpEmailDomainService<C, V>
where
    C: CorpSigningRepository,
    V: VerificationCodeRepository,
{
    pub fn new(repo: C, codes: VerificationCodeService<V>, config: SigningConfig) -> Self {
        Self {
            repo,
            codes,
            config,
        }
    }

    /// Issue a code for adding the domain of `email` to signing `cs_id`.
    /// Domains the matcher would reject get no code.
    pub async fn verification_code(&self, cs_id: &str, email: &EmailAddr) -> ClaResult<String> {
        let mut cs = load(&self.repo, cs_id).await?;
        cs.add_email_domain(email, self.config.min_matching_domain_parts)?;

        self.codes
            .new_code_if_allowed(&Purpose::add_email_domain(cs_id, email))
            .await
    }

    pub async fn add(&self, cs_id: &str, email: &EmailAddr, code: &str) -> ClaResult<()> {
        self.codes
            .verify(code, &Purpose::add_email_domain(cs_id, email))
            .await?;

        let repo = &self.repo;
        let min = self.config.min_matching_domain_parts;
        retry_on_conflict(self.config.max_cas_attempts, || async move {
            let mut cs = load(repo, cs_id).await?;
            cs.add_email_domain(email, min)?;
            repo.add_email_domain(&cs, email.domain()).await
        })
        .await?;

        info!(corp_signing_id = %cs_id, domain = %email.domain(), "Email domain added");
        Ok(())
    }

    pub async fn list(&self, cs_id: &str) -> ClaResult<Vec<String>> {
        self.repo.find_email_domains(cs_id).await
    }
}
