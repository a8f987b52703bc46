//! Adapter trait for executing rendered statements

use sqlforge_core::TargetConfig;

/// Errors that can occur while talking to a database
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("connection failed: {0}")]
    ConnectionError(String),

    #[error("not connected")]
    NotConnected,

    #[error("statement failed: {0}")]
    ExecutionError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Trait for database adapters that execute rendered model statements
///
/// The runner acquires the connection once before the execution loop,
/// executes one DDL statement per model, and closes once after the loop on
/// every exit path. Adapters are used from a single task at a time.
#[async_trait::async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Get the adapter name (e.g., "Postgres", "Mock")
    fn name(&self) -> &'static str;

    /// Open the connection
    async fn connect(&self) -> Result<(), AdapterError>;

    /// Close the connection
    async fn close(&self) -> Result<(), AdapterError>;

    /// Execute one statement with no return rows expected
    async fn execute_ddl(&self, sql: &str) -> Result<(), AdapterError>;
}

/// Resolve a target configuration to a concrete adapter
pub fn for_target(target: &TargetConfig) -> Result<Box<dyn DatabaseAdapter>, AdapterError> {
    match target.adapter_type.to_lowercase().as_str() {
        "mock" => Ok(Box::new(crate::mock::MockAdapter::new())),
        "postgres" => {
            let adapter = crate::postgres::PostgresAdapter::from_target(target)?;
            Ok(Box::new(adapter))
        }
        other => Err(AdapterError::ConfigError(format!(
            "unsupported adapter type '{other}'. Supported: mock, postgres"
        ))),
    }
}
