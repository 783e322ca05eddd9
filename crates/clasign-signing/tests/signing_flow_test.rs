//! Signing workflows end to end against in-memory SurrealDB.

use std::sync::atomic::{AtomicBool, Ordering};

use clasign_auth::{AuthConfig, VerificationCodeService};
use clasign_core::config::SigningConfig;
use clasign_core::email::EmailAddr;
use clasign_core::error::{ClaResult, ErrorCode};
use clasign_core::models::corp_signing::{CorpSigning, CreateCorpSigning, LinkInfo};
use clasign_core::models::link::{Cla, ClaType, CreateLink, Link};
use clasign_core::models::manager::{Manager, Representative};
use clasign_core::repository::{CorpSigningRepository, LinkRepository, UserRepository};
use clasign_db::repository::{
    SurrealCorpSigningRepository, SurrealLinkRepository, SurrealUserRepository,
    SurrealVerificationCodeRepository,
};
use clasign_signing::{
    CorpAdminService, CorpEmailDomainService, CorpPdfService, CorpSigningService,
    EmployeeManagerService, EmployeeSigningService, LinkService, SignCorpCla, SignEmployeeCla,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

type CorpSigningRepo = SurrealCorpSigningRepository<Db>;
type CodeRepo = SurrealVerificationCodeRepository<Db>;

const PDF: &[u8] = b"%PDF-1.7 signed";

struct Harness {
    links: LinkService<SurrealLinkRepository<Db>, CorpSigningRepo>,
    signing: CorpSigningService<CorpSigningRepo, SurrealLinkRepository<Db>, CodeRepo>,
    domains: CorpEmailDomainService<CorpSigningRepo, CodeRepo>,
    admin: CorpAdminService<CorpSigningRepo, SurrealUserRepository<Db>>,
    managers: EmployeeManagerService<CorpSigningRepo, SurrealUserRepository<Db>>,
    employees: EmployeeSigningService<CorpSigningRepo, CodeRepo>,
    pdf: CorpPdfService<CorpSigningRepo>,
    users: SurrealUserRepository<Db>,
}

async fn setup() -> Harness {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    clasign_db::run_migrations(&db).await.unwrap();

    let config = SigningConfig::default();
    let auth = AuthConfig {
        verification_code_interval_secs: 0,
        ..AuthConfig::default()
    };
    let cs_repo = || SurrealCorpSigningRepository::new(db.clone());
    let codes = || VerificationCodeService::new(SurrealVerificationCodeRepository::new(db.clone()), &auth);

    Harness {
        links: LinkService::new(SurrealLinkRepository::new(db.clone()), cs_repo(), config.clone()),
        signing: CorpSigningService::new(
            cs_repo(),
            SurrealLinkRepository::new(db.clone()),
            codes(),
            config.clone(),
        ),
        domains: CorpEmailDomainService::new(cs_repo(), codes(), config.clone()),
        admin: CorpAdminService::new(cs_repo(), SurrealUserRepository::new(db.clone()), config.clone()),
        managers: EmployeeManagerService::new(
            cs_repo(),
            SurrealUserRepository::new(db.clone()),
            config.clone(),
        ),
        employees: EmployeeSigningService::new(cs_repo(), codes(), config.clone()),
        pdf: CorpPdfService::new(cs_repo(), config),
        users: SurrealUserRepository::new(db.clone()),
    }
}

fn email(raw: &str) -> EmailAddr {
    EmailAddr::parse(raw).unwrap()
}

fn person(name: &str, addr: &str) -> Representative {
    Representative {
        name: name.into(),
        email: email(addr),
    }
}

fn manager(id: &str, addr: &str) -> Manager {
    Manager {
        id: id.into(),
        representative: person(id, addr),
    }
}

/// A link with one corporation CLA; returns `(link_id, cla_id)`.
async fn link_with_corp_cla(h: &Harness) -> (String, String) {
    let link = h
        .links
        .create(CreateLink {
            org: "openeuler".into(),
            email_sender: email("cla@openeuler.org"),
            submitter: "maintainer".into(),
        })
        .await
        .unwrap();
    let cla = h
        .links
        .add_cla(
            &link.id,
            Cla {
                id: String::new(),
                cla_type: ClaType::Corporation,
                language: "en".into(),
                url: "https://example.org/corp-cla.pdf".into(),
            },
        )
        .await
        .unwrap();
    (link.id, cla.id)
}

async fn sign_corp(h: &Harness, link_id: &str, cla_id: &str, name: &str, rep: &str) -> CorpSigning {
    let rep = person("Rita", rep);
    let code = h.signing.verification_code(link_id, &rep.email).await.unwrap();
    h.signing
        .sign(
            link_id,
            SignCorpCla {
                cla_id: cla_id.into(),
                language: "en".into(),
                representative: rep,
                corporation_name: name.into(),
                info: Default::default(),
                code,
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn corporation_signs_once() {
    let h = setup().await;
    let (link_id, cla_id) = link_with_corp_cla(&h).await;

    let cs = sign_corp(&h, &link_id, &cla_id, "Example", "rita@corp.example.com").await;
    assert_eq!(cs.version, 0);
    assert_eq!(cs.primary_email_domain(), "corp.example.com");
    assert_eq!(h.signing.list(&link_id).await.unwrap().len(), 1);

    let rep = person("Rita", "rita@corp.example.com");
    let code = h.signing.verification_code(&link_id, &rep.email).await.unwrap();
    let err = h
        .signing
        .sign(
            &link_id,
            SignCorpCla {
                cla_id,
                language: "en".into(),
                representative: rep,
                corporation_name: "Example".into(),
                info: Default::default(),
                code,
            },
        )
        .await
        .unwrap_err();
    assert!(err.is(ErrorCode::CorpSigningReSigning));
}

#[tokio::test]
async fn signing_requires_code_and_corporate_domain() {
    let h = setup().await;
    let (link_id, cla_id) = link_with_corp_cla(&h).await;

    let err = h
        .signing
        .verification_code(&link_id, &email("someone@gmail.com"))
        .await
        .unwrap_err();
    assert!(err.is(ErrorCode::CorpEmailDomainNotAllowed));

    let err = h
        .signing
        .sign(
            &link_id,
            SignCorpCla {
                cla_id,
                language: "en".into(),
                representative: person("Rita", "rita@corp.example.com"),
                corporation_name: "Example".into(),
                info: Default::default(),
                code: "000000".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(err.is(ErrorCode::VerificationCodeWrong));
}

#[tokio::test]
async fn email_domain_added_after_verification() {
    let h = setup().await;
    let (link_id, cla_id) = link_with_corp_cla(&h).await;
    let cs = sign_corp(&h, &link_id, &cla_id, "Example", "rita@corp.example.com").await;

    let err = h
        .domains
        .verification_code(&cs.id, &email("bob@other.com"))
        .await
        .unwrap_err();
    assert!(err.is(ErrorCode::CorpEmailDomainNotMatch));

    let addr = email("bob@dept.example.com");
    let code = h.domains.verification_code(&cs.id, &addr).await.unwrap();
    h.domains.add(&cs.id, &addr, &code).await.unwrap();

    let domains = h.domains.list(&cs.id).await.unwrap();
    assert_eq!(domains, vec!["corp.example.com", "dept.example.com"]);

    let err = h.domains.add(&cs.id, &addr, &code).await.unwrap_err();
    assert!(err.is(ErrorCode::CorpEmailDomainExists));
}

#[tokio::test]
async fn admin_needs_pdf_and_is_set_once() {
    let h = setup().await;
    let (link_id, cla_id) = link_with_corp_cla(&h).await;
    let cs = sign_corp(&h, &link_id, &cla_id, "Example", "rita@corp.example.com").await;

    let err = h.admin.add(&cs.id).await.unwrap_err();
    assert!(err.is(ErrorCode::CorpPdfNotFound));

    let err = h.pdf.upload(&cs.id, b"not a pdf").await.unwrap_err();
    assert!(err.code().is_none());
    h.pdf.upload(&cs.id, PDF).await.unwrap();
    assert_eq!(h.pdf.download(&cs.id).await.unwrap(), PDF);

    let account = h.admin.add(&cs.id).await.unwrap();
    assert_eq!(account.account, "admin_corp.example.com");
    assert_eq!(account.password.len(), 16);
    let user = h
        .users
        .get_by_account(&link_id, "admin_corp.example.com")
        .await
        .unwrap();
    assert_eq!(user.corp_signing_id, cs.id);

    let err = h.admin.add(&cs.id).await.unwrap_err();
    assert!(err.is(ErrorCode::CorpAdminExists));

    let err = h.signing.remove(&cs.id).await.unwrap_err();
    assert!(err.is(ErrorCode::CorpSigningCanNotDelete));
}

#[tokio::test]
async fn second_admin_on_shared_domain_gets_distinct_account() {
    let h = setup().await;
    let (link_id, cla_id) = link_with_corp_cla(&h).await;
    let first = sign_corp(&h, &link_id, &cla_id, "Example", "rita@corp.example.com").await;
    let second = sign_corp(&h, &link_id, &cla_id, "Example Labs", "sam@corp.example.com").await;

    h.pdf.upload(&first.id, PDF).await.unwrap();
    h.pdf.upload(&second.id, PDF).await.unwrap();

    assert_eq!(h.admin.add(&first.id).await.unwrap().account, "admin_corp.example.com");
    assert_eq!(h.admin.add(&second.id).await.unwrap().account, "admin1_corp.example.com");
}

#[tokio::test]
async fn managers_are_bounded_and_same_corp() {
    let h = setup().await;
    let (link_id, cla_id) = link_with_corp_cla(&h).await;
    let cs = sign_corp(&h, &link_id, &cla_id, "Example", "rita@corp.example.com").await;

    let batch: Vec<Manager> = (1..=5)
        .map(|i| manager(&format!("m{i}"), &format!("m{i}@corp.example.com")))
        .collect();
    let accounts = h.managers.add(&cs.id, batch).await.unwrap();
    assert_eq!(accounts.len(), 5);
    assert_eq!(accounts[0].account, "m1_corp.example.com");

    let err = h
        .managers
        .add(&cs.id, vec![manager("m6", "m6@corp.example.com")])
        .await
        .unwrap_err();
    assert!(err.is(ErrorCode::EmployeeManagerTooMany));

    let removed = h.managers.remove(&cs.id, &["m1".to_string()]).await.unwrap();
    assert_eq!(removed.len(), 1);
    assert!(
        h.users
            .get_by_account(&link_id, "m1_corp.example.com")
            .await
            .unwrap_err()
            .is_not_found()
    );

    let err = h
        .managers
        .add(&cs.id, vec![manager("x", "x@elsewhere.com")])
        .await
        .unwrap_err();
    assert!(err.is(ErrorCode::EmployeeManagerNotSameCorp));

    let err = h.managers.remove(&cs.id, &["m1".to_string()]).await.unwrap_err();
    assert!(err.is(ErrorCode::EmployeeManagerNotExists));
    assert_eq!(h.managers.list(&cs.id).await.unwrap().len(), 4);
}

async fn sign_employee(h: &Harness, cs: &CorpSigning, addr: &str) -> ClaResult<String> {
    let rep = person("Emp", addr);
    let code = h.employees.verification_code(&cs.id, &rep.email).await.unwrap();
    sign_employee_with(h, cs, rep, code).await
}

async fn sign_employee_with(
    h: &Harness,
    cs: &CorpSigning,
    rep: Representative,
    code: String,
) -> ClaResult<String> {
    h.employees
        .sign(
            &cs.id,
            SignEmployeeCla {
                cla_id: cs.link.cla_id.clone(),
                language: "en".into(),
                representative: rep,
                info: Default::default(),
                code,
            },
        )
        .await
}

#[tokio::test]
async fn employee_signing_lifecycle() {
    let h = setup().await;
    let (link_id, cla_id) = link_with_corp_cla(&h).await;
    let cs = sign_corp(&h, &link_id, &cla_id, "Example", "rita@corp.example.com").await;

    let err = sign_employee(&h, &cs, "e1@corp.example.com").await.unwrap_err();
    assert!(err.is(ErrorCode::EmployeeSigningNoManager));

    h.managers
        .add(&cs.id, vec![manager("m1", "m1@corp.example.com")])
        .await
        .unwrap();

    let err = sign_employee(&h, &cs, "e1@elsewhere.com").await.unwrap_err();
    assert!(err.is(ErrorCode::EmployeeNotSameCorp));

    let id = sign_employee(&h, &cs, "e1@corp.example.com").await.unwrap();
    let err = sign_employee(&h, &cs, "e1@corp.example.com").await.unwrap_err();
    assert!(err.is(ErrorCode::EmployeeSigningReSigning));

    let es = h.employees.update(&cs.id, &id, true).await.unwrap();
    assert!(es.enabled);
    let err = h.employees.update(&cs.id, &id, true).await.unwrap_err();
    assert!(err.is(ErrorCode::EmployeeSigningEnableAgain));

    let err = h.employees.remove(&cs.id, &id).await.unwrap_err();
    assert!(err.is(ErrorCode::EmployeeSigningCanNotDelete));

    h.employees.update(&cs.id, &id, false).await.unwrap();
    let removed = h.employees.remove(&cs.id, &id).await.unwrap();
    assert!(removed.deleted);
    assert!(h.employees.list(&cs.id).await.unwrap().is_empty());

    let err = h.employees.update(&cs.id, &id, true).await.unwrap_err();
    assert!(err.is(ErrorCode::EmployeeSigningNotFound));
}

#[tokio::test]
async fn corp_signing_code_does_not_sign_employee() {
    let h = setup().await;
    let (link_id, cla_id) = link_with_corp_cla(&h).await;
    let cs = sign_corp(&h, &link_id, &cla_id, "Example", "rita@corp.example.com").await;
    h.managers
        .add(&cs.id, vec![manager("m1", "m1@corp.example.com")])
        .await
        .unwrap();

    let rep = person("Emp", "e1@corp.example.com");
    let corp_code = h.signing.verification_code(&link_id, &rep.email).await.unwrap();
    let err = sign_employee_with(&h, &cs, rep.clone(), corp_code).await.unwrap_err();
    assert!(err.is(ErrorCode::VerificationCodeWrong));

    let err = h
        .employees
        .verification_code("missing", &rep.email)
        .await
        .unwrap_err();
    assert!(err.is(ErrorCode::CorpSigningNotFound));

    let code = h.employees.verification_code(&cs.id, &rep.email).await.unwrap();
    sign_employee_with(&h, &cs, rep, code).await.unwrap();
    assert_eq!(h.employees.list(&cs.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn employee_signs_one_corporation_per_link() {
    let h = setup().await;
    let (link_id, cla_id) = link_with_corp_cla(&h).await;
    let first = sign_corp(&h, &link_id, &cla_id, "Example", "rita@corp.example.com").await;
    let second = sign_corp(&h, &link_id, &cla_id, "Example Labs", "bob@corp.example.com").await;
    h.managers
        .add(&first.id, vec![manager("m1", "m1@corp.example.com")])
        .await
        .unwrap();

    let summaries = h
        .signing
        .find_corp_summary(&link_id, &email("e1@corp.example.com"))
        .await
        .unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].corp_signing_id, first.id);
    assert_eq!(summaries[0].corp_name, "Example");

    h.managers
        .add(&second.id, vec![manager("m2", "m2@corp.example.com")])
        .await
        .unwrap();
    assert_eq!(
        h.signing
            .find_corp_summary(&link_id, &email("e1@corp.example.com"))
            .await
            .unwrap()
            .len(),
        2
    );

    sign_employee(&h, &first, "e1@corp.example.com").await.unwrap();
    let err = sign_employee(&h, &second, "e1@corp.example.com").await.unwrap_err();
    assert!(err.is(ErrorCode::EmployeeSigningReSigning));
    assert!(h.employees.list(&second.id).await.unwrap().is_empty());

    sign_employee(&h, &second, "e2@corp.example.com").await.unwrap();
}

#[tokio::test]
async fn concurrent_employee_signings_both_land() {
    let h = setup().await;
    let (link_id, cla_id) = link_with_corp_cla(&h).await;
    let cs = sign_corp(&h, &link_id, &cla_id, "Example", "rita@corp.example.com").await;
    h.managers
        .add(&cs.id, vec![manager("m1", "m1@corp.example.com")])
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        sign_employee(&h, &cs, "a@corp.example.com"),
        sign_employee(&h, &cs, "b@corp.example.com"),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(h.employees.list(&cs.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn signed_link_can_not_be_removed() {
    let h = setup().await;
    let (link_id, cla_id) = link_with_corp_cla(&h).await;
    let cs = sign_corp(&h, &link_id, &cla_id, "Example", "rita@corp.example.com").await;

    let err = h.links.remove(&link_id).await.unwrap_err();
    assert!(err.is(ErrorCode::LinkCanNotRemove));

    h.signing.remove(&cs.id).await.unwrap();
    let err = h.signing.find(&cs.id).await.unwrap_err();
    assert!(err.is(ErrorCode::CorpSigningNotFound));

    h.links.remove(&link_id).await.unwrap();
    assert!(h.links.find(&link_id).await.unwrap_err().is_not_found());
}

/// Signs a corporation under the link the first time the link is read,
/// standing in for a signing that lands while the link is being removed.
struct SignedWhileRemoving {
    inner: SurrealLinkRepository<Db>,
    signings: CorpSigningRepo,
    fired: AtomicBool,
}

impl LinkRepository for SignedWhileRemoving {
    async fn create(&self, input: CreateLink) -> ClaResult<Link> {
        self.inner.create(input).await
    }

    async fn get_by_id(&self, id: &str) -> ClaResult<Link> {
        let link = self.inner.get_by_id(id).await?;
        if !self.fired.swap(true, Ordering::SeqCst) {
            self.signings
                .add(CreateCorpSigning {
                    link: LinkInfo {
                        link_id: link.id.clone(),
                        cla_id: "cla_1".into(),
                        language: "en".into(),
                    },
                    representative: person("Late", "late@corp.example.com"),
                    corporation_name: "Late Corp".into(),
                    info: Default::default(),
                })
                .await?;
        }
        Ok(link)
    }

    async fn save_clas(&self, link: &Link) -> ClaResult<()> {
        self.inner.save_clas(link).await
    }

    async fn delete(&self, link: &Link) -> ClaResult<()> {
        self.inner.delete(link).await
    }
}

#[tokio::test]
async fn link_signed_during_removal_is_kept() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    clasign_db::run_migrations(&db).await.unwrap();

    let config = SigningConfig::default();
    let plain = LinkService::new(
        SurrealLinkRepository::new(db.clone()),
        SurrealCorpSigningRepository::new(db.clone()),
        config.clone(),
    );
    let link = plain
        .create(CreateLink {
            org: "openeuler".into(),
            email_sender: email("cla@openeuler.org"),
            submitter: "maintainer".into(),
        })
        .await
        .unwrap();

    let racing = LinkService::new(
        SignedWhileRemoving {
            inner: SurrealLinkRepository::new(db.clone()),
            signings: SurrealCorpSigningRepository::new(db.clone()),
            fired: AtomicBool::new(false),
        },
        SurrealCorpSigningRepository::new(db.clone()),
        config,
    );
    let err = racing.remove(&link.id).await.unwrap_err();
    assert!(err.is(ErrorCode::LinkCanNotRemove));
    assert_eq!(plain.find(&link.id).await.unwrap().id, link.id);
}

#[tokio::test]
async fn cla_ids_follow_the_link_counter() {
    let h = setup().await;
    let (link_id, first) = link_with_corp_cla(&h).await;
    assert_eq!(first, "cla_1");

    let cla = h
        .links
        .add_cla(
            &link_id,
            Cla {
                id: String::new(),
                cla_type: ClaType::Individual,
                language: "zh".into(),
                url: "https://example.org/individual-cla.pdf".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(cla.id, "cla_2");
    assert_eq!(h.links.find(&link_id).await.unwrap().clas.len(), 2);
}
