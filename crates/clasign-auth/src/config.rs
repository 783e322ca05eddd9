//! Authentication configuration.

use serde::{Deserialize, Deserializer};

/// Configuration for tokens, verification codes and manager login.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 256-bit AES-GCM key sealing access tokens and email credentials,
    /// hex-encoded in configuration files. Required at startup.
    #[serde(deserialize_with = "hex_key")]
    pub encryption_key: Option<[u8; 32]>,
    /// Access token lifetime in seconds (default: 3600 = 1 hour).
    pub access_token_lifetime_secs: u64,
    /// How long a rotated-out token stays readable, in seconds (default: 5).
    pub access_token_grace_secs: u64,
    /// Random bytes in a CSRF secret (default: 24).
    pub csrf_token_len: usize,
    /// Verification code lifetime in seconds (default: 300 = 5 minutes).
    pub verification_code_lifetime_secs: u64,
    /// Digits in a verification code (default: 6).
    pub verification_code_len: usize,
    /// Minimum gap between two codes for the same purpose (default: 60).
    pub verification_code_interval_secs: u64,
    /// Consecutive failed logins before the account freezes (default: 5).
    pub max_failed_login_attempts: u32,
    /// Freeze duration in seconds (default: 300 = 5 min).
    pub lockout_duration_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            encryption_key: None,
            access_token_lifetime_secs: 3600,
            access_token_grace_secs: 5,
            csrf_token_len: 24,
            verification_code_lifetime_secs: 300,
            verification_code_len: 6,
            verification_code_interval_secs: 60,
            max_failed_login_attempts: 5,
            lockout_duration_secs: 300,
            pepper: None,
        }
    }
}

fn hex_key<'de, D>(deserializer: D) -> Result<Option<[u8; 32]>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let bytes = hex::decode(raw.trim()).map_err(D::Error::custom)?;
    let key: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| D::Error::custom(format!("key must be 32 bytes, got {}", b.len())))?;
    Ok(Some(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        auth: AuthConfig,
    }

    fn parse(json: &str) -> Result<AuthConfig, serde_json::Error> {
        serde_json::from_str::<Wrapper>(json).map(|w| w.auth)
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = parse(r#"{"auth": {"access_token_lifetime_secs": 60}}"#).unwrap();
        assert_eq!(config.access_token_lifetime_secs, 60);
        assert_eq!(config.verification_code_len, 6);
        assert!(config.encryption_key.is_none());
    }

    #[test]
    fn key_is_hex_decoded() {
        let hex_key = "ab".repeat(32);
        let config = parse(&format!(r#"{{"auth": {{"encryption_key": "{hex_key}"}}}}"#)).unwrap();
        assert_eq!(config.encryption_key, Some([0xab; 32]));
    }

    #[test]
    fn short_key_rejected() {
        assert!(parse(r#"{"auth": {"encryption_key": "abcd"}}"#).is_err());
    }
}
