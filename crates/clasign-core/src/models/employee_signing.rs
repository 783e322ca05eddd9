//! Individual CLA signed by an employee of a signed corporation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ClaResult, ErrorCode};
use crate::models::AllSigningInfo;
use crate::models::manager::Representative;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeSigningAction {
    Enable,
    Disable,
    Delete,
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSigningLog {
    pub time: DateTime<Utc>,
    pub action: EmployeeSigningAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeSigning {
    /// Assigned by the repository when the signing is stored.
    pub id: String,
    pub cla_id: String,
    pub language: String,
    pub representative: Representative,
    pub signed_at: DateTime<Utc>,
    pub enabled: bool,
    pub deleted: bool,
    pub info: AllSigningInfo,
    pub logs: Vec<EmployeeSigningLog>,
}

impl EmployeeSigning {
    /// A fresh, disabled signing awaiting a manager's approval.
    pub fn new(
        cla_id: impl Into<String>,
        language: impl Into<String>,
        representative: Representative,
        info: AllSigningInfo,
    ) -> Self {
        Self {
            id: String::new(),
            cla_id: cla_id.into(),
            language: language.into(),
            representative,
            signed_at: Utc::now(),
            enabled: false,
            deleted: false,
            info,
            logs: Vec::new(),
        }
    }

    pub(crate) fn is_same_signer(&self, other: &EmployeeSigning) -> bool {
        self.representative.email == other.representative.email
    }

    pub fn enable(&mut self) -> ClaResult<()> {
        if self.enabled {
            return Err(ErrorCode::EmployeeSigningEnableAgain.into());
        }
        self.enabled = true;
        self.log(EmployeeSigningAction::Enable);
        Ok(())
    }

    pub fn disable(&mut self) -> ClaResult<()> {
        if !self.enabled {
            return Err(ErrorCode::EmployeeSigningDisableAgain.into());
        }
        self.enabled = false;
        self.log(EmployeeSigningAction::Disable);
        Ok(())
    }

    /// Only a disabled signing may be deleted, and only once.
    pub fn delete(&mut self) -> ClaResult<()> {
        if self.enabled || self.deleted {
            return Err(ErrorCode::EmployeeSigningCanNotDelete.into());
        }
        self.deleted = true;
        self.log(EmployeeSigningAction::Delete);
        Ok(())
    }

    fn log(&mut self, action: EmployeeSigningAction) {
        self.logs.push(EmployeeSigningLog {
            time: Utc::now(),
            action,
        });
    }
}
