//! The corporation signing aggregate.
//!
//! A `CorpSigning` is read at some [`version`](CorpSigning::version),
//! mutated in memory through the methods below, and written back with a
//! compare-and-swap on that version. A write that loses the race fails with
//! [`ErrorCode::ConcurrentUpdating`] and the caller re-reads and re-validates.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::email::EmailAddr;
use crate::error::{ClaResult, ErrorCode};
use crate::models::AllSigningInfo;
use crate::models::corporation::Corporation;
use crate::models::employee_signing::EmployeeSigning;
use crate::models::manager::{Manager, Representative, Role};

/// The CLA a corporation signed within a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInfo {
    pub link_id: String,
    pub cla_id: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpSigning {
    pub id: String,
    /// Starts at 0; the store increments it on every accepted write.
    pub version: u64,
    pub signed_at: DateTime<Utc>,
    pub link: LinkInfo,
    pub representative: Representative,
    pub corporation: Corporation,
    /// Set once, after the signed PDF has been uploaded.
    pub admin: Option<Manager>,
    pub managers: Vec<Manager>,
    pub employees: Vec<EmployeeSigning>,
    /// The PDF bytes are loaded separately; see `find_corp_pdf`.
    pub has_pdf: bool,
    pub info: AllSigningInfo,
}

/// Fields required to create a corporation signing.
#[derive(Debug, Clone)]
pub struct CreateCorpSigning {
    pub link: LinkInfo,
    pub representative: Representative,
    pub corporation_name: String,
    pub info: AllSigningInfo,
}

/// A signing an employee with a given email domain could sign under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpSummary {
    pub corp_signing_id: String,
    pub corp_name: String,
    pub has_manager: bool,
}

impl CreateCorpSigning {
    pub fn corporation(&self) -> Corporation {
        Corporation::new(self.corporation_name.clone(), &self.representative.email)
    }
}

impl CorpSigning {
    pub fn primary_email_domain(&self) -> &str {
        &self.corporation.primary_email_domain
    }

    pub fn role_of(&self, email: &EmailAddr) -> Option<Role> {
        if self.admin.as_ref().is_some_and(|a| a.has_email(email)) {
            return Some(Role::Admin);
        }
        self.managers
            .iter()
            .any(|m| m.has_email(email))
            .then_some(Role::Manager)
    }

    /// A signing whose admin has been set is referenced by accounts and
    /// can not be removed.
    pub fn can_remove(&self) -> ClaResult<()> {
        if self.admin.is_some() {
            return Err(ErrorCode::CorpSigningCanNotDelete.into());
        }
        Ok(())
    }

    pub fn can_set_admin(&self) -> ClaResult<()> {
        if !self.has_pdf {
            return Err(ErrorCode::CorpPdfNotFound.into());
        }
        if self.admin.is_some() {
            return Err(ErrorCode::CorpAdminExists.into());
        }
        Ok(())
    }

    /// Make the signer the admin.
    ///
    /// `seq` is the number of other signings of the same link sharing the
    /// primary domain; it keeps the admin's account unique.
    pub fn set_admin(&mut self, seq: u64) -> ClaResult<&Manager> {
        self.can_set_admin()?;

        let id = if seq == 0 {
            "admin".to_string()
        } else {
            format!("admin{seq}")
        };

        let admin = Manager {
            id,
            representative: self.representative.clone(),
        };
        Ok(&*self.admin.insert(admin))
    }

    pub fn add_email_domain(&mut self, email: &EmailAddr, min_matching_parts: usize) -> ClaResult<()> {
        self.corporation
            .add_email_domain(email.domain(), min_matching_parts)
    }

    pub fn add_managers(&mut self, managers: &[Manager], max: usize) -> ClaResult<()> {
        if self.managers.len() + managers.len() > max {
            return Err(ErrorCode::EmployeeManagerTooMany.into());
        }

        for (i, m) in managers.iter().enumerate() {
            if !self.corporation.is_my_email(&m.representative.email) {
                return Err(ErrorCode::EmployeeManagerNotSameCorp.into());
            }

            if self.managers.iter().any(|x| x.is_same(m))
                || managers[..i].iter().any(|x| x.is_same(m))
            {
                return Err(ErrorCode::EmployeeManagerExists.into());
            }

            if self.admin.as_ref().is_some_and(|a| a.is_same(m)) {
                return Err(ErrorCode::EmployeeManagerAdminAsManager.into());
            }
        }

        self.managers.extend_from_slice(managers);
        Ok(())
    }

    /// Remove managers by id and return them.
    pub fn remove_managers(&mut self, ids: &[String], max: usize) -> ClaResult<Vec<Manager>> {
        if ids.len() > max {
            return Err(ErrorCode::EmployeeManagerTooMany.into());
        }

        let to_remove: HashSet<&str> = ids.iter().map(String::as_str).collect();
        if to_remove
            .iter()
            .any(|id| !self.managers.iter().any(|m| m.id == *id))
        {
            return Err(ErrorCode::EmployeeManagerNotExists.into());
        }

        let (removed, kept): (Vec<Manager>, Vec<Manager>) = std::mem::take(&mut self.managers)
            .into_iter()
            .partition(|m| to_remove.contains(m.id.as_str()));
        self.managers = kept;

        Ok(removed)
    }

    pub fn add_employee(&mut self, es: EmployeeSigning) -> ClaResult<()> {
        if self.managers.is_empty() {
            return Err(ErrorCode::EmployeeSigningNoManager.into());
        }

        if !self.corporation.is_my_email(&es.representative.email) {
            return Err(ErrorCode::EmployeeNotSameCorp.into());
        }

        if self.employees.iter().any(|e| e.is_same_signer(&es)) {
            return Err(ErrorCode::EmployeeSigningReSigning.into());
        }

        self.employees.push(es);
        Ok(())
    }

    pub fn update_employee(&mut self, id: &str, enabled: bool) -> ClaResult<&EmployeeSigning> {
        let es = self.employee_mut(id)?;
        if enabled {
            es.enable()?;
        } else {
            es.disable()?;
        }
        Ok(&*es)
    }

    /// Mark the employee signing deleted and take it out of the active list.
    pub fn remove_employee(&mut self, id: &str) -> ClaResult<EmployeeSigning> {
        self.employee_mut(id)?.delete()?;

        let pos = self
            .employees
            .iter()
            .position(|e| e.id == id)
            .ok_or(ErrorCode::EmployeeSigningNotFound)?;

        Ok(self.employees.remove(pos))
    }

    pub fn employee(&self, id: &str) -> Option<&EmployeeSigning> {
        self.employees.iter().find(|e| e.id == id)
    }

    fn employee_mut(&mut self, id: &str) -> ClaResult<&mut EmployeeSigning> {
        self.employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ErrorCode::EmployeeSigningNotFound.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(s: &str) -> EmailAddr {
        EmailAddr::parse(s).unwrap()
    }

    fn rep(name: &str, addr: &str) -> Representative {
        Representative {
            name: name.into(),
            email: email(addr),
        }
    }

    fn manager(id: &str, addr: &str) -> Manager {
        Manager {
            id: id.into(),
            representative: rep(id, addr),
        }
    }

    fn signing() -> CorpSigning {
        let input = CreateCorpSigning {
            link: LinkInfo {
                link_id: "link1".into(),
                cla_id: "cla_1".into(),
                language: "english".into(),
            },
            representative: rep("Rita", "rita@corp.example.com"),
            corporation_name: "Example Corp".into(),
            info: AllSigningInfo::new(),
        };
        CorpSigning {
            id: "cs1".into(),
            version: 0,
            signed_at: Utc::now(),
            corporation: input.corporation(),
            link: input.link,
            representative: input.representative,
            admin: None,
            managers: Vec::new(),
            employees: Vec::new(),
            has_pdf: false,
            info: input.info,
        }
    }

    fn employee(addr: &str) -> EmployeeSigning {
        EmployeeSigning::new("cla_2", "english", rep("e", addr), AllSigningInfo::new())
    }

    #[test]
    fn admin_requires_pdf_then_is_set_once() {
        let mut cs = signing();
        assert!(cs.set_admin(0).unwrap_err().is(ErrorCode::CorpPdfNotFound));

        cs.has_pdf = true;
        let admin = cs.set_admin(0).unwrap();
        assert_eq!(admin.id, "admin");
        assert_eq!(admin.representative.email.as_str(), "rita@corp.example.com");

        assert!(cs.set_admin(0).unwrap_err().is(ErrorCode::CorpAdminExists));
    }

    #[test]
    fn admin_id_is_suffixed_by_sequence() {
        let mut cs = signing();
        cs.has_pdf = true;
        assert_eq!(cs.set_admin(2).unwrap().id, "admin2");
    }

    #[test]
    fn sixth_manager_exceeds_ceiling() {
        let mut cs = signing();
        let five: Vec<_> = (0..5)
            .map(|i| manager(&format!("m{i}"), &format!("m{i}@corp.example.com")))
            .collect();
        cs.add_managers(&five, 5).unwrap();

        let err = cs
            .add_managers(&[manager("m5", "m5@corp.example.com")], 5)
            .unwrap_err();
        assert!(err.is(ErrorCode::EmployeeManagerTooMany));
        assert_eq!(cs.managers.len(), 5);
    }

    #[test]
    fn manager_from_foreign_domain_rejected() {
        let mut cs = signing();
        let err = cs
            .add_managers(&[manager("m1", "m1@other.com")], 5)
            .unwrap_err();
        assert!(err.is(ErrorCode::EmployeeManagerNotSameCorp));
    }

    #[test]
    fn manager_duplicates_rejected_within_batch_and_state() {
        let mut cs = signing();
        let batch = [
            manager("m1", "a@corp.example.com"),
            manager("m1", "b@corp.example.com"),
        ];
        assert!(
            cs.add_managers(&batch, 5)
                .unwrap_err()
                .is(ErrorCode::EmployeeManagerExists)
        );
        assert!(cs.managers.is_empty());

        cs.add_managers(&batch[..1], 5).unwrap();
        assert!(
            cs.add_managers(&[manager("m9", "a@corp.example.com")], 5)
                .unwrap_err()
                .is(ErrorCode::EmployeeManagerExists)
        );
    }

    #[test]
    fn admin_can_not_become_manager() {
        let mut cs = signing();
        cs.has_pdf = true;
        cs.set_admin(0).unwrap();
        let err = cs
            .add_managers(&[manager("boss", "rita@corp.example.com")], 5)
            .unwrap_err();
        assert!(err.is(ErrorCode::EmployeeManagerAdminAsManager));
    }

    #[test]
    fn remove_unknown_manager_fails() {
        let mut cs = signing();
        cs.add_managers(&[manager("m1", "m1@corp.example.com")], 5)
            .unwrap();
        let err = cs.remove_managers(&["nope".into()], 5).unwrap_err();
        assert!(err.is(ErrorCode::EmployeeManagerNotExists));

        let removed = cs.remove_managers(&["m1".into()], 5).unwrap();
        assert_eq!(removed.len(), 1);
        assert!(cs.managers.is_empty());
    }

    #[test]
    fn employee_rules() {
        let mut cs = signing();
        assert!(
            cs.add_employee(employee("e@corp.example.com"))
                .unwrap_err()
                .is(ErrorCode::EmployeeSigningNoManager)
        );

        cs.add_managers(&[manager("m1", "m1@corp.example.com")], 5)
            .unwrap();
        assert!(
            cs.add_employee(employee("e@elsewhere.com"))
                .unwrap_err()
                .is(ErrorCode::EmployeeNotSameCorp)
        );

        cs.add_employee(employee("e@corp.example.com")).unwrap();
        assert!(
            cs.add_employee(employee("e@corp.example.com"))
                .unwrap_err()
                .is(ErrorCode::EmployeeSigningReSigning)
        );
    }

    #[test]
    fn employee_enable_disable_remove() {
        let mut cs = signing();
        cs.add_managers(&[manager("m1", "m1@corp.example.com")], 5)
            .unwrap();
        let mut es = employee("e@corp.example.com");
        es.id = "e1".into();
        cs.add_employee(es).unwrap();

        assert!(cs.update_employee("e1", true).unwrap().enabled);
        assert!(
            cs.update_employee("e1", true)
                .unwrap_err()
                .is(ErrorCode::EmployeeSigningEnableAgain)
        );
        assert!(
            cs.remove_employee("e1")
                .unwrap_err()
                .is(ErrorCode::EmployeeSigningCanNotDelete)
        );

        cs.update_employee("e1", false).unwrap();
        let removed = cs.remove_employee("e1").unwrap();
        assert!(removed.deleted);
        assert!(cs.employees.is_empty());
        assert!(
            cs.update_employee("e1", true)
                .unwrap_err()
                .is(ErrorCode::EmployeeSigningNotFound)
        );
    }

    #[test]
    fn email_domain_grows_only_through_matcher() {
        let mut cs = signing();
        assert!(
            cs.add_email_domain(&email("x@corp.example.com"), 2)
                .unwrap_err()
                .is(ErrorCode::CorpEmailDomainExists)
        );
        assert!(
            cs.add_email_domain(&email("x@corp.other.com"), 2)
                .unwrap_err()
                .is(ErrorCode::CorpEmailDomainNotMatch)
        );
        cs.add_email_domain(&email("x@dept.example.com"), 2).unwrap();
        assert_eq!(
            cs.corporation.all_email_domains,
            vec!["corp.example.com", "dept.example.com"]
        );
    }

    #[test]
    fn roles_by_email() {
        let mut cs = signing();
        cs.has_pdf = true;
        cs.set_admin(0).unwrap();
        cs.add_managers(&[manager("m1", "m1@corp.example.com")], 5)
            .unwrap();
        assert_eq!(cs.role_of(&email("rita@corp.example.com")), Some(Role::Admin));
        assert_eq!(cs.role_of(&email("m1@corp.example.com")), Some(Role::Manager));
        assert_eq!(cs.role_of(&email("x@corp.example.com")), None);
        assert!(cs.can_remove().unwrap_err().is(ErrorCode::CorpSigningCanNotDelete));
    }
}
