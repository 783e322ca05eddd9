//! Login accounts backing admins and managers.

use clasign_auth::random::random_password;
use clasign_core::error::{ClaError, ClaResult, ErrorCode};
use clasign_core::models::corp_signing::CorpSigning;
use clasign_core::models::manager::{Manager, Role};
use clasign_core::models::user::CreateUser;
use clasign_core::repository::{CorpSigningRepository, UserRepository};
use tracing::error;

use crate::dto::ManagerAccount;

/// Read a signing, reporting absence in signing terms.
pub(crate) async fn load<C: CorpSigningRepository>(repo: &C, id: &str) -> ClaResult<CorpSigning> {
    repo.find(id).await.map_err(|e| {
        if e.is_not_found() {
            ClaError::from(ErrorCode::CorpSigningNotFound)
        } else {
            e
        }
    })
}

pub(crate) async fn create_account<U: UserRepository>(
    users: &U,
    cs: &CorpSigning,
    manager: &Manager,
    role: Role,
) -> ClaResult<ManagerAccount> {
    let password = random_password();
    let user = users
        .create(CreateUser {
            link_id: cs.link.link_id.clone(),
            corp_signing_id: cs.id.clone(),
            account: manager.account(),
            email: manager.representative.email.clone(),
            role,
            password: password.clone(),
        })
        .await?;

    Ok(ManagerAccount {
        manager: manager.clone(),
        account: user.account,
        password,
    })
}

/// Delete accounts whose managers never made it into the signing. Failures
/// are logged; the caller is already reporting the original error.
pub(crate) async fn drop_accounts<U: UserRepository>(users: &U, cs: &CorpSigning, accounts: &[String]) {
    if let Err(e) = users.delete_by_accounts(&cs.link.link_id, accounts).await {
        error!(
            corp_signing_id = %cs.id,
            error = %e,
            "Failed to drop accounts of unsaved managers"
        );
    }
}
