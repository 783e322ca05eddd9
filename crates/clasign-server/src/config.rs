//! Server configuration, read from a TOML file.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clasign_auth::AuthConfig;
use clasign_core::config::SigningConfig;
use clasign_db::DbConfig;
use serde::Deserialize;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "CLASIGN_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "clasign.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub signing: SigningConfig,
    /// Seconds between sweeps of expired tokens, codes and login counters
    /// (default: 300).
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db: DbConfig::default(),
            auth: AuthConfig::default(),
            signing: SigningConfig::default(),
            sweep_interval_secs: 300,
        }
    }
}

impl ServerConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// The mandatory encryption key.
    pub fn encryption_key(&self) -> Result<[u8; 32]> {
        match self.auth.encryption_key {
            Some(key) => Ok(key),
            None => bail!("auth.encryption_key is required (64 hex characters)"),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[test]
    fn parses_sections_and_keeps_defaults() {
        let config = ServerConfig::parse(&format!(
            r#"
            sweep_interval_secs = 60

            [db]
            endpoint = "db.internal:8000"

            [db.credentials]
            username = "root"
            password = "secret"

            [auth]
            encryption_key = "{KEY}"
            max_failed_login_attempts = 3

            [signing]
            max_employee_managers = 10
            "#
        ))
        .unwrap();

        assert_eq!(config.db.endpoint, "db.internal:8000");
        assert_eq!(config.db.credentials.as_ref().unwrap().username, "root");
        assert_eq!(config.db.query_timeout_secs, 5);
        assert_eq!(config.auth.max_failed_login_attempts, 3);
        assert_eq!(config.auth.access_token_lifetime_secs, 3600);
        assert_eq!(config.signing.max_employee_managers, 10);
        assert_eq!(config.signing.max_cas_attempts, 3);
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.encryption_key().unwrap()[31], 0x1f);
    }

    #[test]
    fn key_is_mandatory() {
        let config = ServerConfig::parse("").unwrap();
        assert!(config.encryption_key().is_err());
    }

    #[test]
    fn short_key_is_rejected() {
        assert!(ServerConfig::parse("[auth]\nencryption_key = \"abcd\"").is_err());
    }

    #[test]
    fn missing_file_means_defaults() {
        let config = ServerConfig::load(Path::new("/nonexistent/clasign.toml")).unwrap();
        assert_eq!(config.sweep_interval_secs, 300);
    }
}
