//! Authentication error types.

use clasign_core::error::{ClaError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid access token: {0}")]
    TokenInvalid(String),

    #[error("wrong verification code")]
    WrongCode,

    #[error("verification code requested too often")]
    CodeBusy,

    #[error("account is frozen")]
    AccountFrozen,

    #[error("wrong account or password")]
    InvalidCredentials,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for ClaError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenInvalid(_) => ErrorCode::AccessTokenInvalid.into(),
            AuthError::WrongCode => ErrorCode::VerificationCodeWrong.into(),
            AuthError::CodeBusy => ErrorCode::VerificationCodeBusy.into(),
            AuthError::AccountFrozen => ErrorCode::UserFrozen.into(),
            AuthError::InvalidCredentials => ErrorCode::UserWrongAccountOrPassword.into(),
            AuthError::Crypto(msg) => ClaError::Crypto(msg),
        }
    }
}
