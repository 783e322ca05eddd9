//! Symmetric encryption of opaque payloads at rest.
//!
//! AES-256-GCM with a random 96-bit nonce per message. The sealed form is
//! `nonce || ciphertext || tag`.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};

use crate::error::AuthError;

const NONCE_LEN: usize = 12;

pub trait SymmetricEncryption: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, AuthError>;
    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, AuthError>;
}

#[derive(Clone)]
pub struct AesGcmEncryption {
    cipher: Aes256Gcm,
}

impl AesGcmEncryption {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }
}

impl std::fmt::Debug for AesGcmEncryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesGcmEncryption { .. }")
    }
}

impl SymmetricEncryption for AesGcmEncryption {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, AuthError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| AuthError::Crypto(format!("AES-GCM encrypt: {e}")))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(combined)
    }

    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, AuthError> {
        if sealed.len() <= NONCE_LEN {
            return Err(AuthError::Crypto("ciphertext too short".into()));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| AuthError::Crypto(format!("AES-GCM decrypt: {e}")))
    }
}
