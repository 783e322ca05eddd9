//! Inputs and outputs of the signing services.

use clasign_core::models::AllSigningInfo;
use clasign_core::models::manager::{Manager, Representative};
use serde::{Deserialize, Serialize};

/// A corporation signing a CLA of a link.
#[derive(Debug, Clone, Deserialize)]
pub struct SignCorpCla {
    pub cla_id: String,
    pub language: String,
    pub representative: Representative,
    pub corporation_name: String,
    #[serde(default)]
    pub info: AllSigningInfo,
    /// Verification code sent to the representative's email.
    pub code: String,
}

/// An employee signing the individual CLA under a corporation.
#[derive(Debug, Clone, Deserialize)]
pub struct SignEmployeeCla {
    pub cla_id: String,
    pub language: String,
    pub representative: Representative,
    #[serde(default)]
    pub info: AllSigningInfo,
    pub code: String,
}

/// A login account created for an admin or manager. The password is only
/// ever returned here.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerAccount {
    pub manager: Manager,
    pub account: String,
    pub password: String,
}
