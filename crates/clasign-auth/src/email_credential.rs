//! Sender mailbox credentials, encrypted at rest.

use clasign_core::email::EmailAddr;
use clasign_core::error::ClaResult;
use clasign_core::models::email_credential::EmailCredential;
use clasign_core::repository::EmailCredentialRepository;

use crate::encryption::SymmetricEncryption;

#[derive(Clone)]
pub struct EmailCredentialService<R: EmailCredentialRepository, E: SymmetricEncryption> {
    repo: R,
    encryption: E,
}

impl<R: EmailCredentialRepository, E: SymmetricEncryption> EmailCredentialService<R, E> {
    pub fn new(repo: R, encryption: E) -> Self {
        Self { repo, encryption }
    }

    /// Store `secret` (an OAuth refresh token or SMTP password) for `addr`.
    pub async fn add(&self, addr: EmailAddr, secret: &[u8], platform: &str) -> ClaResult<()> {
        let credential = EmailCredential {
            addr,
            token: self.encryption.encrypt(secret)?,
            platform: platform.to_string(),
        };
        self.repo.add(&credential).await
    }

    /// The credential with its secret decrypted.
    pub async fn find(&self, addr: &EmailAddr) -> ClaResult<EmailCredential> {
        let mut credential = self.repo.find(addr).await?;
        credential.token = self.encryption.decrypt(&credential.token)?;
        Ok(credential)
    }
}
