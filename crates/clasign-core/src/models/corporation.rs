//! Corporation identity and its recognized email domains.

use serde::{Deserialize, Serialize};

use crate::domain_matcher::is_valid_new_domain;
use crate::email::EmailAddr;
use crate::error::{ClaResult, ErrorCode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corporation {
    pub name: String,
    /// Domain of the first signer; anchor for every additional domain.
    pub primary_email_domain: String,
    /// Always contains the primary domain.
    pub all_email_domains: Vec<String>,
}

impl Corporation {
    pub fn new(name: impl Into<String>, signer: &EmailAddr) -> Self {
        let domain = signer.domain().to_string();
        Self {
            name: name.into(),
            primary_email_domain: domain.clone(),
            all_email_domains: vec![domain],
        }
    }

    pub fn is_my_email(&self, email: &EmailAddr) -> bool {
        self.all_email_domains.iter().any(|d| d == email.domain())
    }

    /// Validate `domain` against the matcher and record it.
    pub(crate) fn add_email_domain(&mut self, domain: &str, min_matching_parts: usize) -> ClaResult<()> {
        if self.all_email_domains.iter().any(|d| d == domain) {
            return Err(ErrorCode::CorpEmailDomainExists.into());
        }

        if !is_valid_new_domain(&self.primary_email_domain, domain, min_matching_parts) {
            return Err(ErrorCode::CorpEmailDomainNotMatch.into());
        }

        self.all_email_domains.push(domain.to_string());
        Ok(())
    }
}
