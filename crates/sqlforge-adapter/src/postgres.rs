//! PostgreSQL adapter
//!
//! Executes rendered model statements against PostgreSQL and compatible
//! databases (Redshift, CockroachDB). Only compiled in with the `postgres`
//! feature; without it the constructor reports a configuration error so the
//! target can still be named in sqlforge.toml.
//!
//! ## Configuration
//!
//! ```toml
//! [targets.prod]
//! type = "postgres"
//! host = "db.internal"
//! port = "5432"
//! dbname = "analytics"
//! user = "sqlforge"
//! password = "..."
//! schema = "marts"
//! ```

use crate::adapter::{AdapterError, DatabaseAdapter};
use sqlforge_core::TargetConfig;

#[cfg(feature = "postgres")]
use tokio::sync::RwLock;

#[cfg(feature = "postgres")]
use tokio_postgres::{Client, NoTls};

/// PostgreSQL database adapter
#[derive(Debug)]
pub struct PostgresAdapter {
    /// libpq-style connection string
    conn_string: String,

    /// Live client, populated by connect()
    #[cfg(feature = "postgres")]
    client: RwLock<Option<Client>>,
}

impl PostgresAdapter {
    /// Build an adapter from a target's connection settings
    ///
    /// Requires `host`, `dbname`, and `user`; `port` defaults to 5432 and
    /// `password` is optional (e.g. trust or peer authentication).
    pub fn from_target(target: &TargetConfig) -> Result<Self, AdapterError> {
        let require = |key: &str| {
            target.setting(key).ok_or_else(|| {
                AdapterError::ConfigError(format!("postgres target requires '{key}'"))
            })
        };

        let host = require("host")?;
        let dbname = require("dbname")?;
        let user = require("user")?;
        let port = target.setting("port").unwrap_or("5432");

        let mut conn_string = format!("host={host} port={port} dbname={dbname} user={user}");
        if let Some(password) = target.setting("password") {
            conn_string.push_str(&format!(" password={password}"));
        }

        Ok(Self::from_connection_string(conn_string))
    }

    /// Build an adapter from a raw connection string
    pub fn from_connection_string(conn_string: impl Into<String>) -> Self {
        Self {
            conn_string: conn_string.into(),
            #[cfg(feature = "postgres")]
            client: RwLock::new(None),
        }
    }
}

#[cfg(feature = "postgres")]
#[async_trait::async_trait]
impl DatabaseAdapter for PostgresAdapter {
    fn name(&self) -> &'static str {
        "Postgres"
    }

    async fn connect(&self) -> Result<(), AdapterError> {
        let (client, connection) = tokio_postgres::connect(&self.conn_string, NoTls)
            .await
            .map_err(|e| AdapterError::ConnectionError(e.to_string()))?;

        // Drive the connection in the background; it resolves when the
        // client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                eprintln!("postgres connection error: {e}");
            }
        });

        *self.client.write().await = Some(client);
        Ok(())
    }

    async fn close(&self) -> Result<(), AdapterError> {
        self.client.write().await.take();
        Ok(())
    }

    async fn execute_ddl(&self, sql: &str) -> Result<(), AdapterError> {
        let guard = self.client.read().await;
        let client = guard.as_ref().ok_or(AdapterError::NotConnected)?;

        client
            .batch_execute(sql)
            .await
            .map_err(|e| AdapterError::ExecutionError(e.to_string()))
    }
}

#[cfg(not(feature = "postgres"))]
#[async_trait::async_trait]
impl DatabaseAdapter for PostgresAdapter {
    fn name(&self) -> &'static str {
        "Postgres"
    }

    async fn connect(&self) -> Result<(), AdapterError> {
        let _ = &self.conn_string;
        Err(AdapterError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres"
                .to_string(),
        ))
    }

    async fn close(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn execute_ddl(&self, _sql: &str) -> Result<(), AdapterError> {
        Err(AdapterError::NotConnected)
    }
}
