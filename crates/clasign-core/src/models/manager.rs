//! Corporation admin and employee managers.

use serde::{Deserialize, Serialize};

use crate::email::EmailAddr;

/// The person acting for a corporation or signing as an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representative {
    pub name: String,
    pub email: EmailAddr,
}

/// Role of a manager within a corporation signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manager {
    /// Account-like handle, unique within the corporation.
    pub id: String,
    pub representative: Representative,
}

impl Manager {
    /// Two managers collide when either the email or the id matches.
    pub fn is_same(&self, other: &Manager) -> bool {
        self.representative.email == other.representative.email || self.id == other.id
    }

    pub fn has_email(&self, email: &EmailAddr) -> bool {
        &self.representative.email == email
    }

    /// Login account of the manager: `<id>_<email domain>`.
    pub fn account(&self) -> String {
        format!("{}_{}", self.id, self.representative.email.domain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(id: &str, email: &str) -> Manager {
        Manager {
            id: id.into(),
            representative: Representative {
                name: id.into(),
                email: EmailAddr::parse(email).unwrap(),
            },
        }
    }

    #[test]
    fn same_by_email_or_id() {
        let a = manager("m1", "a@corp.com");
        assert!(a.is_same(&manager("m2", "a@corp.com")));
        assert!(a.is_same(&manager("m1", "b@corp.com")));
        assert!(!a.is_same(&manager("m2", "b@corp.com")));
    }

    #[test]
    fn account_combines_id_and_domain() {
        assert_eq!(manager("admin", "a@Corp.com").account(), "admin_corp.com");
    }
}
