//! Employee signings under a signed corporation.

use clasign_auth::VerificationCodeService;
use clasign_core::config::SigningConfig;
use clasign_core::email::EmailAddr;
use clasign_core::error::{ClaResult, ErrorCode};
use clasign_core::models::employee_signing::EmployeeSigning;
use clasign_core::purpose::Purpose;
use clasign_core::repository::{CorpSigningRepository, VerificationCodeRepository};
use tracing::info;

use crate::accounts::load;
use crate::dto::SignEmployeeCla;
use crate::retry::retry_on_conflict;

#[derive(Clone)]
pub struct EmployeeSigningService<C, V>
where
    C: CorpSigningRepository,
    V: VerificationCodeRepository,
{
    repo: C,
    codes: VerificationCodeService<V>,
    config: SigningConfig,
}

impl<C, V> EmployeeSigningService<C, V>
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

    /// A code for signing as an employee of `cs_id`. Unknown signings get
    /// no code.
    pub async fn verification_code(&self, cs_id: &str, email: &EmailAddr) -> ClaResult<String> {
        load(&self.repo, cs_id).await?;
        self.codes
            .new_code_if_allowed(&Purpose::employee_signing(cs_id, email))
            .await
    }

    /// Sign as an employee. The signing starts disabled until a manager
    /// enables it. Returns the new signing's id.
    pub async fn sign(&self, cs_id: &str, input: SignEmployeeCla) -> ClaResult<String> {
        load(&self.repo, cs_id).await?;
        self.codes
            .verify(
                &input.code,
                &Purpose::employee_signing(cs_id, &input.representative.email),
            )
            .await?;

        let es = &EmployeeSigning::new(
            input.cla_id,
            input.language,
            input.representative,
            input.info,
        );
        let repo = &self.repo;
        let id = retry_on_conflict(self.config.max_cas_attempts, || async move {
            let mut cs = load(repo, cs_id).await?;
            cs.add_employee(es.clone())?;

            let signed = repo
                .find_employees_by_email(&cs.link.link_id, &es.representative.email)
                .await?;
            if !signed.is_empty() {
                return Err(ErrorCode::EmployeeSigningReSigning.into());
            }

            repo.add_employee(&cs, es).await
        })
        .await?;

        info!(corp_signing_id = %cs_id, employee_signing_id = %id, "Employee signed");
        Ok(id)
    }

    pub async fn update(&self, cs_id: &str, id: &str, enabled: bool) -> ClaResult<EmployeeSigning> {
        let repo = &self.repo;
        retry_on_conflict(self.config.max_cas_attempts, || async move {
            let mut cs = load(repo, cs_id).await?;
            let es = cs.update_employee(id, enabled)?.clone();
            repo.save_employee(&cs, &es).await?;
            Ok(es)
        })
        .await
    }

    /// Remove a disabled employee signing; it is kept in the deleted list.
    pub async fn remove(&self, cs_id: &str, id: &str) -> ClaResult<EmployeeSigning> {
        let repo = &self.repo;
        let es = retry_on_conflict(self.config.max_cas_attempts, || async move {
            let mut cs = load(repo, cs_id).await?;
            let es = cs.remove_employee(id)?;
            repo.remove_employee(&cs, &es).await?;
            Ok(es)
        })
        .await?;

        info!(corp_signing_id = %cs_id, employee_signing_id = %id, "Employee signing removed");
        Ok(es)
    }

    pub async fn list(&self, cs_id: &str) -> ClaResult<Vec<EmployeeSigning>> {
        self.repo.find_employees(cs_id).await
    }
}
