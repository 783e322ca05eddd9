//! CLA signing services: the workflows behind corporation and employee
//! signing, composed from the aggregate, its repository, and the
//! verification code service.
//!
//! Every write reads the aggregate, validates the change against that
//! state and writes it back conditioned on the version it read. A lost
//! race is retried from the read by [`retry_on_conflict`].

mod accounts;
pub mod corp_admin;
pub mod corp_pdf;
pub mod corp_signing;
pub mod dto;
pub mod email_domain;
pub mod employee_manager;
pub mod employee_signing;
pub mod link;
pub mod retry;

pub use corp_admin::CorpAdminService;
pub use corp_pdf::CorpPdfService;
pub use corp_signing::CorpSigningService;
pub use dto::{ManagerAccount, SignCorpCla, SignEmployeeCla};
pub use email_domain::CorpEmailDomainService;
pub use employee_manager::EmployeeManagerService;
pub use employee_signing::EmployeeSigningService;
pub use link::LinkService;
pub use retry::retry_on_conflict;
