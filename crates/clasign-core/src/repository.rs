//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Writes to versioned aggregates
//! are compare-and-swap: the caller passes the aggregate as it last read
//! it, the store applies the change only while the stored version still
//! matches and increments it on success. A lost race surfaces as
//! [`ErrorCode::ConcurrentUpdating`](crate::error::ErrorCode); no
//! repository retries or merges on the caller's behalf.

use std::time::Duration;

use uuid::Uuid;

use crate::email::EmailAddr;
use crate::error::ClaResult;
use crate::models::{
    corp_signing::{CorpSigning, CorpSummary, CreateCorpSigning},
    email_credential::EmailCredential,
    employee_signing::EmployeeSigning,
    link::{CreateLink, Link},
    login::Login,
    manager::Manager,
    user::{CreateUser, User},
    verification_code::VerificationCode,
};
use crate::purpose::Purpose;

// ---------------------------------------------------------------------------
// Corporation signing aggregate
// ---------------------------------------------------------------------------

pub trait CorpSigningRepository: Send + Sync {
    /// Insert unless a signing with the same `(link, representative email)`
    /// or `(link, corporation name, primary domain)` exists, in which case
    /// fail with `DuplicateCreating`.
    fn add(&self, input: CreateCorpSigning) -> impl Future<Output = ClaResult<CorpSigning>> + Send;
    fn find(&self, id: &str) -> impl Future<Output = ClaResult<CorpSigning>> + Send;
    fn list_by_link(&self, link_id: &str) -> impl Future<Output = ClaResult<Vec<CorpSigning>>> + Send;
    /// Signings of the link whose recognized domains contain `domain`.
    fn find_corp_summary(
        &self,
        link_id: &str,
        domain: &str,
    ) -> impl Future<Output = ClaResult<Vec<CorpSummary>>> + Send;
    /// Signings of the link with primary domain `domain` whose admin is set.
    fn count_admins_by_domain(
        &self,
        link_id: &str,
        domain: &str,
    ) -> impl Future<Output = ClaResult<u64>> + Send;
    fn has_signed_link(&self, link_id: &str) -> impl Future<Output = ClaResult<bool>> + Send;
    /// CAS delete; the removed aggregate is archived, never hard-deleted.
    fn remove(&self, cs: &CorpSigning) -> impl Future<Output = ClaResult<()>> + Send;

    fn add_admin(&self, cs: &CorpSigning) -> impl Future<Output = ClaResult<()>> + Send;

    fn add_employee_managers(
        &self,
        cs: &CorpSigning,
        managers: &[Manager],
    ) -> impl Future<Output = ClaResult<()>> + Send;
    fn remove_employee_managers(
        &self,
        cs: &CorpSigning,
        ids: &[String],
    ) -> impl Future<Output = ClaResult<()>> + Send;
    fn find_employee_managers(&self, id: &str) -> impl Future<Output = ClaResult<Vec<Manager>>> + Send;

    /// Append the employee signing, assigning its id. Returns the id.
    fn add_employee(
        &self,
        cs: &CorpSigning,
        es: &EmployeeSigning,
    ) -> impl Future<Output = ClaResult<String>> + Send;
    /// Persist the state of an existing employee signing.
    fn save_employee(
        &self,
        cs: &CorpSigning,
        es: &EmployeeSigning,
    ) -> impl Future<Output = ClaResult<()>> + Send;
    /// Move the (already deleted) employee signing to the deleted list.
    fn remove_employee(
        &self,
        cs: &CorpSigning,
        es: &EmployeeSigning,
    ) -> impl Future<Output = ClaResult<()>> + Send;
    fn find_employees(&self, id: &str) -> impl Future<Output = ClaResult<Vec<EmployeeSigning>>> + Send;
    /// Active employee signings by `email` across every signing of the link.
    fn find_employees_by_email(
        &self,
        link_id: &str,
        email: &EmailAddr,
    ) -> impl Future<Output = ClaResult<Vec<EmployeeSigning>>> + Send;

    fn add_email_domain(
        &self,
        cs: &CorpSigning,
        domain: &str,
    ) -> impl Future<Output = ClaResult<()>> + Send;
    fn find_email_domains(&self, id: &str) -> impl Future<Output = ClaResult<Vec<String>>> + Send;

    fn save_corp_pdf(
        &self,
        cs: &CorpSigning,
        pdf: &[u8],
    ) -> impl Future<Output = ClaResult<()>> + Send;
    fn find_corp_pdf(&self, id: &str) -> impl Future<Output = ClaResult<Vec<u8>>> + Send;
}

// ---------------------------------------------------------------------------
// Expiring records
// ---------------------------------------------------------------------------

pub trait AccessTokenRepository: Send + Sync {
    /// Store an encrypted token record for `ttl`; returns its new id.
    fn add(&self, sealed: Vec<u8>, ttl: Duration) -> impl Future<Output = ClaResult<String>> + Send;
    /// Fails with `NotFound` when absent or past its store expiry.
    fn find(&self, id: &str) -> impl Future<Output = ClaResult<Vec<u8>>> + Send;
    /// Shorten the record's remaining life to at most `ttl`.
    fn expire(&self, id: &str, ttl: Duration) -> impl Future<Output = ClaResult<()>> + Send;
    fn purge_expired(&self) -> impl Future<Output = ClaResult<u64>> + Send;
}

pub trait VerificationCodeRepository: Send + Sync {
    /// Store the code, replacing any earlier code for the same purpose.
    fn add(&self, code: &VerificationCode) -> impl Future<Output = ClaResult<()>> + Send;
    fn find(
        &self,
        code: &str,
        purpose: &Purpose,
    ) -> impl Future<Output = ClaResult<VerificationCode>> + Send;
    fn find_by_purpose(
        &self,
        purpose: &Purpose,
    ) -> impl Future<Output = ClaResult<Option<VerificationCode>>> + Send;
    fn purge_expired(&self) -> impl Future<Output = ClaResult<u64>> + Send;
}

pub trait LoginRepository: Send + Sync {
    /// Upsert the failure record, kept for `ttl`.
    fn save(&self, login: &Login, ttl: Duration) -> impl Future<Output = ClaResult<()>> + Send;
    fn find(&self, id: &str) -> impl Future<Output = ClaResult<Login>> + Send;
    fn delete(&self, id: &str) -> impl Future<Output = ClaResult<()>> + Send;
    fn purge_expired(&self) -> impl Future<Output = ClaResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Accounts, links, credentials
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = ClaResult<User>> + Send;
    fn get_by_account(
        &self,
        link_id: &str,
        account: &str,
    ) -> impl Future<Output = ClaResult<User>> + Send;
    fn get_by_email(
        &self,
        link_id: &str,
        email: &EmailAddr,
    ) -> impl Future<Output = ClaResult<User>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = ClaResult<()>> + Send;
    fn delete_by_accounts(
        &self,
        link_id: &str,
        accounts: &[String],
    ) -> impl Future<Output = ClaResult<()>> + Send;
}

pub trait LinkRepository: Send + Sync {
    fn create(&self, input: CreateLink) -> impl Future<Output = ClaResult<Link>> + Send;
    fn get_by_id(&self, id: &str) -> impl Future<Output = ClaResult<Link>> + Send;
    /// CAS write of the CLA list and counter.
    fn save_clas(&self, link: &Link) -> impl Future<Output = ClaResult<()>> + Send;
    /// CAS delete.
    fn delete(&self, link: &Link) -> impl Future<Output = ClaResult<()>> + Send;
}

pub trait EmailCredentialRepository: Send + Sync {
    /// Upsert by address. `token` is expected to be encrypted already.
    fn add(&self, credential: &EmailCredential) -> impl Future<Output = ClaResult<()>> + Send;
    fn find(&self, addr: &EmailAddr) -> impl Future<Output = ClaResult<EmailCredential>> + Send;
}
