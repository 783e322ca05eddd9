//! Credentials of a sending email account.

use crate::email::EmailAddr;

/// An email sender's secret (OAuth refresh token or SMTP password).
///
/// `token` is plaintext in memory and encrypted at rest.
#[derive(Debug, Clone)]
pub struct EmailCredential {
    pub addr: EmailAddr,
    pub token: Vec<u8>,
    pub platform: String,
}
