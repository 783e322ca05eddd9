//! CLA signing auth: symmetric encryption, access tokens, verification
//! codes, login lockout and manager login.

pub mod access_token;
pub mod config;
pub mod email_credential;
pub mod encryption;
pub mod error;
pub mod lockout;
pub mod password;
pub mod random;
pub mod service;
pub mod verification_code;

pub use access_token::AccessTokenService;
pub use config::AuthConfig;
pub use email_credential::EmailCredentialService;
pub use encryption::{AesGcmEncryption, SymmetricEncryption};
pub use error::AuthError;
pub use lockout::LoginLockoutService;
pub use service::{LoginClaims, LoginInput, LoginOutput, LoginService};
pub use verification_code::VerificationCodeService;
