//! Domain models for CLA signing.
//!
//! These are the core types shared across all crates. Aggregate methods
//! validate a change against the current state and apply it in memory;
//! persisting the change is the repository's job.

pub mod access_token;
pub mod corp_signing;
pub mod corporation;
pub mod email_credential;
pub mod employee_signing;
pub mod link;
pub mod login;
pub mod manager;
pub mod user;
pub mod verification_code;

/// Free-form signing metadata captured when a CLA is signed.
pub type AllSigningInfo = std::collections::BTreeMap<String, String>;
