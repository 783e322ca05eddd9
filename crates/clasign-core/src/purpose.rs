//! Purpose strings that bind a verification code to one action.

use std::fmt;

use crate::email::EmailAddr;
use crate::error::{ClaError, ClaResult};

/// Uniquely describes the action and subject a verification code is
/// valid for. Every contextual value that must not be replayable across
/// actions is embedded in the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Purpose(String);

impl Purpose {
    pub fn new(value: impl Into<String>) -> ClaResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ClaError::validation("empty purpose"));
        }
        Ok(Self(value))
    }

    /// Signing a CLA of `link_id` as `email`.
    pub fn signing(link_id: &str, email: &EmailAddr) -> Self {
        Self(format!("sign: {link_id}, {email}"))
    }

    /// Signing as an employee of corporation signing `cs_id`.
    pub fn employee_signing(cs_id: &str, email: &EmailAddr) -> Self {
        Self(format!("sign as employee: {cs_id}, {email}"))
    }

    /// Adding the domain of `email` to corporation signing `cs_id`.
    pub fn add_email_domain(cs_id: &str, email: &EmailAddr) -> Self {
        Self(format!("add email domain: {cs_id}, {email}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purposes_embed_their_context() {
        let email = EmailAddr::parse("bob@corp.com").unwrap();
        let a = Purpose::add_email_domain("cs1", &email);
        let b = Purpose::add_email_domain("cs2", &email);
        let c = Purpose::signing("cs1", &email);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "add email domain: cs1, bob@corp.com");
    }

    #[test]
    fn employee_signing_differs_from_corp_signing() {
        let email = EmailAddr::parse("alice@corp.com").unwrap();
        let corp = Purpose::signing("cs1", &email);
        let employee = Purpose::employee_signing("cs1", &email);
        assert_ne!(corp, employee);
        assert_eq!(employee.as_str(), "sign as employee: cs1, alice@corp.com");
    }

    #[test]
    fn empty_purpose_rejected() {
        assert!(Purpose::new("  ").is_err());
    }
}
