//! Validated email address.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ClaError, ClaResult};

const MAX_EMAIL_LEN: usize = 254;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9+_.-]+@[a-zA-Z0-9-]+(\.[a-zA-Z0-9-]+)*\.[a-zA-Z]{2,}$")
        .expect("email regex is valid")
});

/// An email address; the domain part is stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddr(String);

impl EmailAddr {
    pub fn parse(raw: &str) -> ClaResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(raw) {
            return Err(ClaError::validation(format!("invalid email address: {raw}")));
        }

        // The regex guarantees exactly one '@'.
        let (local, domain) = raw.split_once('@').unwrap_or((raw, ""));
        Ok(Self(format!("{local}@{}", domain.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn domain(&self) -> &str {
        self.0.split_once('@').map(|(_, d)| d).unwrap_or_default()
    }
}

impl fmt::Display for EmailAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EmailAddr {
    type Error = ClaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmailAddr> for String {
    fn from(value: EmailAddr) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_is_lowercased() {
        let e = EmailAddr::parse("Alice@Corp.Example.COM").unwrap();
        assert_eq!(e.domain(), "corp.example.com");
        assert_eq!(e.as_str(), "Alice@corp.example.com");
    }

    #[test]
    fn rejects_malformed() {
        assert!(EmailAddr::parse("").is_err());
        assert!(EmailAddr::parse("no-at-sign").is_err());
        assert!(EmailAddr::parse("a@b").is_err());
        assert!(EmailAddr::parse("a@@b.com").is_err());
    }
}
