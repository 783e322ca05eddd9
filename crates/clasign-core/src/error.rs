//! Error types for CLA signing.
//!
//! Domain failures carry a stable [`ErrorCode`]. Infrastructure failures
//! (store, timeout, crypto, serialization) carry no code so that callers
//! can never confuse them with a validation outcome.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Stable, transport-independent codes for domain failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Generic to any aggregate.
    DuplicateCreating,
    ResourceNotFound,
    ConcurrentUpdating,

    // Corporation signing.
    CorpAdminExists,
    CorpPdfNotFound,
    CorpSigningReSigning,
    CorpSigningNotFound,
    CorpSigningCanNotDelete,
    CorpEmailDomainExists,
    CorpEmailDomainNotMatch,
    CorpEmailDomainNotAllowed,

    // Employee managers.
    EmployeeManagerExists,
    EmployeeManagerTooMany,
    EmployeeManagerNotSameCorp,
    EmployeeManagerAdminAsManager,
    EmployeeManagerNotExists,

    // Employee signing.
    EmployeeSigningReSigning,
    EmployeeSigningEnableAgain,
    EmployeeSigningDisableAgain,
    EmployeeSigningNoManager,
    EmployeeSigningNotFound,
    EmployeeSigningCanNotDelete,
    EmployeeNotSameCorp,

    // Verification codes and tokens.
    VerificationCodeWrong,
    VerificationCodeBusy,
    AccessTokenInvalid,

    // Accounts.
    UserFrozen,
    UserWrongAccountOrPassword,

    // Links and email credentials.
    LinkCanNotRemove,
    EmailCredentialNotFound,
}

impl ErrorCode {
    /// The snake_case code handed to adapters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicateCreating => "duplicate_creating",
            Self::ResourceNotFound => "resource_not_found",
            Self::ConcurrentUpdating => "concurrent_updating",
            Self::CorpAdminExists => "corp_admin_exists",
            Self::CorpPdfNotFound => "corp_pdf_not_found",
            Self::CorpSigningReSigning => "corp_signing_resigning",
            Self::CorpSigningNotFound => "corp_signing_not_found",
            Self::CorpSigningCanNotDelete => "corp_signing_can_not_delete",
            Self::CorpEmailDomainExists => "corp_email_domain_exists",
            Self::CorpEmailDomainNotMatch => "corp_email_domain_not_match",
            Self::CorpEmailDomainNotAllowed => "corp_email_domain_not_allowed",
            Self::EmployeeManagerExists => "employee_manager_exists",
            Self::EmployeeManagerTooMany => "employee_manager_too_many",
            Self::EmployeeManagerNotSameCorp => "employee_manager_not_same_corp",
            Self::EmployeeManagerAdminAsManager => "employee_manager_admin_as_manager",
            Self::EmployeeManagerNotExists => "employee_manager_not_exists",
            Self::EmployeeSigningReSigning => "employee_signing_resigning",
            Self::EmployeeSigningEnableAgain => "employee_signing_enable_again",
            Self::EmployeeSigningDisableAgain => "employee_signing_disable_again",
            Self::EmployeeSigningNoManager => "employee_signing_no_manager",
            Self::EmployeeSigningNotFound => "employee_signing_not_found",
            Self::EmployeeSigningCanNotDelete => "employee_signing_can_not_delete",
            Self::EmployeeNotSameCorp => "employee_not_same_corp",
            Self::VerificationCodeWrong => "verification_code_wrong",
            Self::VerificationCodeBusy => "verification_code_busy",
            Self::AccessTokenInvalid => "access_token_invalid",
            Self::UserFrozen => "user_frozen",
            Self::UserWrongAccountOrPassword => "user_wrong_account_or_password",
            Self::LinkCanNotRemove => "link_can_not_remove",
            Self::EmailCredentialNotFound => "email_credential_not_found",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().replace('_', " "))
    }
}

#[derive(Debug, Error)]
pub enum ClaError {
    #[error("{0}")]
    Domain(ErrorCode),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClaError {
    /// The domain code of this failure, `None` for infrastructure errors.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Domain(code) => Some(*code),
            Self::NotFound { .. } => Some(ErrorCode::ResourceNotFound),
            _ => None,
        }
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code() == Some(code)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_concurrent_updating(&self) -> bool {
        self.is(ErrorCode::ConcurrentUpdating)
    }
}

impl ClaError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<ErrorCode> for ClaError {
    fn from(code: ErrorCode) -> Self {
        Self::Domain(code)
    }
}

impl From<serde_json::Error> for ClaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type ClaResult<T> = Result<T, ClaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_snake_case_and_messages_readable() {
        let code = ErrorCode::EmployeeManagerTooMany;
        assert_eq!(code.as_str(), "employee_manager_too_many");
        assert_eq!(code.to_string(), "employee manager too many");
    }

    #[test]
    fn infrastructure_errors_have_no_code() {
        assert_eq!(ClaError::Database("boom".into()).code(), None);
        assert_eq!(ClaError::Timeout(Duration::from_secs(1)).code(), None);
        assert_eq!(ClaError::Crypto("bad tag".into()).code(), None);
    }

    #[test]
    fn not_found_maps_to_resource_not_found() {
        let err = ClaError::NotFound {
            entity: "corp_signing".into(),
            id: "x".into(),
        };
        assert!(err.is(ErrorCode::ResourceNotFound));
        assert!(err.is_not_found());
    }
}
