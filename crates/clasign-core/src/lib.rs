//! CLA signing core: domain models, error taxonomy, domain limits and
//! repository traits shared by every crate in the workspace.

pub mod config;
pub mod domain_matcher;
pub mod email;
pub mod error;
pub mod models;
pub mod purpose;
pub mod repository;

pub use config::SigningConfig;
pub use domain_matcher::is_valid_new_domain;
pub use email::EmailAddr;
pub use error::{ClaError, ClaResult, ErrorCode};
pub use purpose::Purpose;
