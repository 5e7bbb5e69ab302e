//! SurrealDB connection management.
//!
//! The endpoint scheme picks the engine: `mem://` runs an embedded
//! in-memory store, `ws://host:port` connects to a server.

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::run_migrations;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Endpoint, e.g. `mem://` or `ws://127.0.0.1:8000`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials. Sign-in is skipped unless both are set.
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "mem://".into(),
            namespace: "lazysignup".into(),
            database: "main".into(),
            username: None,
            password: None,
        }
    }
}

impl DbConfig {
    fn root(&self) -> Option<Root> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Root {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

/// A ready-to-use connection with namespace and database selected.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Any>,
}

impl DbManager {
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = any::connect(config.url.as_str()).await?;
        if let Some(root) = config.root() {
            db.signin(root).await?;
        }
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        Ok(Self { db })
    }

    /// Connect and bring the schema up to date.
    pub async fn connect_and_migrate(config: &DbConfig) -> Result<Self, DbError> {
        let manager = Self::connect(config).await?;
        run_migrations(&manager.db).await?;
        Ok(manager)
    }

    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }
}
