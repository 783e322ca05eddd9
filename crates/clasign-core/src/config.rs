//! Domain limits for CLA signing.

use serde::Deserialize;

/// Limits enforced by the signing aggregates and services.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Ceiling on employee managers per corporation (default: 5).
    pub max_employee_managers: usize,
    /// Trailing domain labels a new email domain must share with the
    /// primary domain (default: 2).
    pub min_matching_domain_parts: usize,
    /// Attempts a service makes when a write loses the version race
    /// (default: 3).
    pub max_cas_attempts: u32,
    /// Public mail providers that can not sign as a corporation.
    pub invalid_corp_email_domains: Vec<String>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            max_employee_managers: 5,
            min_matching_domain_parts: 2,
            max_cas_attempts: 3,
            invalid_corp_email_domains: vec![
                "gmail.com".into(),
                "outlook.com".into(),
                "hotmail.com".into(),
                "163.com".into(),
                "qq.com".into(),
            ],
        }
    }
}

impl SigningConfig {
    pub fn is_allowed_corp_domain(&self, domain: &str) -> bool {
        !self
            .invalid_corp_email_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(domain))
    }
}
