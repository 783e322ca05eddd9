//! Manager password checks against stored Argon2id hashes.

use std::borrow::Cow;

use argon2::password_hash::Error as HashError;
use argon2::{Argon2, PasswordHash, PasswordVerifier};

use crate::error::AuthError;

/// Check `password` against a PHC-format hash.
///
/// A mismatch is [`AuthError::InvalidCredentials`]; a stored hash that does
/// not parse is a crypto failure. `pepper` is prepended and must be the one
/// the hash was made with.
pub fn check_password(password: &str, stored: &str, pepper: Option<&str>) -> Result<(), AuthError> {
    let hash = PasswordHash::new(stored)
        .map_err(|e| AuthError::Crypto(format!("stored password hash: {e}")))?;

    let input: Cow<'_, str> = match pepper {
        Some(p) => Cow::Owned(format!("{p}{password}")),
        None => Cow::Borrowed(password),
    };

    Argon2::default()
        .verify_password(input.as_bytes(), &hash)
        .map_err(|e| match e {
            HashError::Password => AuthError::InvalidCredentials,
            other => AuthError::Crypto(format!("argon2: {other}")),
        })
}

#[cfg(test)]
mod tests {
    use argon2::PasswordHasher;
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;

    use super::*;

    fn phc(input: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(input.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[test]
    fn accepts_only_the_right_password() {
        let stored = phc("correct horse");
        assert!(check_password("correct horse", &stored, None).is_ok());
        assert!(matches!(
            check_password("battery staple", &stored, None),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn pepper_is_part_of_the_secret() {
        let stored = phc("s1lt-correct horse");
        assert!(check_password("correct horse", &stored, Some("s1lt-")).is_ok());
        assert!(check_password("correct horse", &stored, None).is_err());
    }

    #[test]
    fn unparsable_hash_is_not_a_mismatch() {
        assert!(matches!(
            check_password("x", "plaintext?", None),
            Err(AuthError::Crypto(_))
        ));
    }
}
