//! Service wiring. Every service gets its collaborators passed in; the
//! only shared state is the database handle.

use clasign_auth::{
    AccessTokenService, AesGcmEncryption, EmailCredentialService, LoginLockoutService,
    LoginService, VerificationCodeService,
};
use clasign_db::repository::{
    SurrealAccessTokenRepository, SurrealCorpSigningRepository, SurrealEmailCredentialRepository,
    SurrealLinkRepository, SurrealLoginRepository, SurrealUserRepository,
    SurrealVerificationCodeRepository,
};
use clasign_signing::{
    CorpAdminService, CorpEmailDomainService, CorpPdfService, CorpSigningService,
    EmployeeManagerService, EmployeeSigningService, LinkService,
};
use surrealdb::{Connection, Surreal};

use crate::config::ServerConfig;

type CorpSigningRepo<C> = SurrealCorpSigningRepository<C>;
type CodeRepo<C> = SurrealVerificationCodeRepository<C>;

pub struct Services<C: Connection> {
    pub links: LinkService<SurrealLinkRepository<C>, CorpSigningRepo<C>>,
    pub corp_signing: CorpSigningService<CorpSigningRepo<C>, SurrealLinkRepository<C>, CodeRepo<C>>,
    pub email_domains: CorpEmailDomainService<CorpSigningRepo<C>, CodeRepo<C>>,
    pub corp_admin: CorpAdminService<CorpSigningRepo<C>, SurrealUserRepository<C>>,
    pub employee_managers: EmployeeManagerService<CorpSigningRepo<C>, SurrealUserRepository<C>>,
    pub employee_signing: EmployeeSigningService<CorpSigningRepo<C>, CodeRepo<C>>,
    pub corp_pdf: CorpPdfService<CorpSigningRepo<C>>,
    pub login: LoginService<
        SurrealUserRepository<C>,
        SurrealLoginRepository<C>,
        SurrealAccessTokenRepository<C>,
        AesGcmEncryption,
    >,
    pub email_credentials: EmailCredentialService<SurrealEmailCredentialRepository<C>, AesGcmEncryption>,
}

impl<C: Connection> Services<C> {
    pub fn new(db: &Surreal<C>, config: &ServerConfig, key: &[u8; 32]) -> Self {
        let timeout = config.db.query_timeout();
        let signing = &config.signing;
        let auth = &config.auth;
        let encryption = AesGcmEncryption::new(key);

        let corp_signings = || SurrealCorpSigningRepository::with_timeout(db.clone(), timeout);
        let links = || SurrealLinkRepository::with_timeout(db.clone(), timeout);
        let users = || {
            let repo = match &auth.pepper {
                Some(pepper) => SurrealUserRepository::with_pepper(db.clone(), pepper.clone()),
                None => SurrealUserRepository::new(db.clone()),
            };
            repo.timeout(timeout)
        };
        let codes = || {
            VerificationCodeService::new(
                SurrealVerificationCodeRepository::with_timeout(db.clone(), timeout),
                auth,
            )
        };

        let tokens = AccessTokenService::new(
            SurrealAccessTokenRepository::with_timeout(db.clone(), timeout),
            encryption.clone(),
            auth,
        );
        let lockout = LoginLockoutService::new(
            SurrealLoginRepository::with_timeout(db.clone(), timeout),
            auth,
        );

        Self {
            links: LinkService::new(links(), corp_signings(), signing.clone()),
            corp_signing: CorpSigningService::new(corp_signings(), links(), codes(), signing.clone()),
            email_domains: CorpEmailDomainService::new(corp_signings(), codes(), signing.clone()),
            corp_admin: CorpAdminService::new(corp_signings(), users(), signing.clone()),
            employee_managers: EmployeeManagerService::new(corp_signings(), users(), signing.clone()),
            employee_signing: EmployeeSigningService::new(corp_signings(), codes(), signing.clone()),
            corp_pdf: CorpPdfService::new(corp_signings(), signing.clone()),
            login: LoginService::new(users(), lockout, tokens, auth),
            email_credentials: EmailCredentialService::new(
                SurrealEmailCredentialRepository::with_timeout(db.clone(), timeout),
                encryption,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use clasign_auth::LoginInput;
    use clasign_core::email::EmailAddr;
    use clasign_core::error::ErrorCode;
    use clasign_core::models::link::CreateLink;
    use surrealdb::engine::local::Mem;

    use super::*;

    #[tokio::test]
    async fn wired_services_share_one_store() {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        clasign_db::run_migrations(&db).await.unwrap();

        let services = Services::new(&db, &ServerConfig::default(), &[9u8; 32]);

        let link = services
            .links
            .create(CreateLink {
                org: "openeuler".into(),
                email_sender: EmailAddr::parse("cla@openeuler.org").unwrap(),
                submitter: "maintainer".into(),
            })
            .await
            .unwrap();
        assert!(services.corp_signing.list(&link.id).await.unwrap().is_empty());

        let err = services
            .login
            .login(LoginInput {
                link_id: link.id.clone(),
                account_or_email: "admin_example.com".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is(ErrorCode::UserWrongAccountOrPassword));
    }
}
