//! SurrealDB connection bootstrap.

use std::time::Duration;

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::query::bounded;

/// Root credentials. Omit them for a server started without auth.
#[derive(Debug, Clone, Deserialize)]
pub struct DbCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// WebSocket endpoint, `host:port`.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DbCredentials>,
    /// Bound on every store round-trip, connecting included, in seconds
    /// (default: 5).
    pub query_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:8000".into(),
            namespace: "clasign".into(),
            database: "signing".into(),
            credentials: None,
            query_timeout_secs: 5,
        }
    }
}

impl DbConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// An open client plus the bound its repositories should use.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
    query_timeout: Duration,
}

impl DbManager {
    /// Open the WebSocket client, sign in when credentials are given and
    /// select namespace and database. Each step is bounded by the query
    /// timeout, so an unreachable store fails startup instead of hanging it.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let limit = config.query_timeout();
        info!(
            endpoint = %config.endpoint,
            namespace = %config.namespace,
            database = %config.database,
            "Opening SurrealDB client"
        );

        let db = bounded(limit, Surreal::new::<Ws>(config.endpoint.as_str())).await?;

        if let Some(creds) = &config.credentials {
            bounded(
                limit,
                db.signin(Root {
                    username: creds.username.clone(),
                    password: creds.password.clone(),
                }),
            )
            .await?;
        }

        bounded(limit, db.use_ns(&config.namespace).use_db(&config.database)).await?;

        info!("SurrealDB client ready");
        Ok(Self {
            db,
            query_timeout: limit,
        })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }
}
