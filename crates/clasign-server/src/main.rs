//! CLA signing server: loads configuration, prepares the database, wires
//! the services and keeps expiring records in check until shutdown.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clasign_db::repository::{
    SurrealAccessTokenRepository, SurrealLoginRepository, SurrealVerificationCodeRepository,
};
use clasign_db::{DbManager, run_migrations};
use clasign_server::config::{CONFIG_ENV, DEFAULT_CONFIG_PATH};
use clasign_server::{ServerConfig, Services, Sweeper};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clasign=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    info!("Starting CLA signing server");

    let path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = ServerConfig::load(&path)?;
    let key = config.encryption_key()?;

    let manager = DbManager::connect(&config.db)
        .await
        .context("Failed to connect to SurrealDB")?;
    let db = manager.client();
    run_migrations(db)
        .await
        .context("Failed to run database migrations")?;

    let _services = Services::new(db, &config, &key);
    info!("Services ready");

    let timeout = manager.query_timeout();
    let sweeper = Sweeper::new(
        SurrealAccessTokenRepository::with_timeout(db.clone(), timeout),
        SurrealVerificationCodeRepository::with_timeout(db.clone(), timeout),
        SurrealLoginRepository::with_timeout(db.clone(), timeout),
    );

    tokio::select! {
        _ = sweeper.run(config.sweep_interval()) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
        }
    }

    info!("CLA signing server stopped");
    Ok(())
}
