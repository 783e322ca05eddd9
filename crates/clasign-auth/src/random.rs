//! Random secrets: CSRF bytes, numeric codes, one-time passwords.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::rng().fill(bytes.as_mut_slice());
    bytes
}

/// A code of `len` decimal digits, leading zeros allowed.
pub fn numeric_code(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Initial password for a newly created manager account.
pub fn random_password() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 12] = rng.random();
    URL_SAFE_NO_PAD.encode(bytes)
}
