//! SurrealDB repository implementations.

mod access_token;
mod corp_signing;
mod email_credential;
mod link;
mod login;
mod user;
mod verification_code;

pub use access_token::SurrealAccessTokenRepository;
pub use corp_signing::SurrealCorpSigningRepository;
pub use email_credential::SurrealEmailCredentialRepository;
pub use link::SurrealLinkRepository;
pub use login::SurrealLoginRepository;
pub use user::SurrealUserRepository;
pub use verification_code::SurrealVerificationCodeRepository;
