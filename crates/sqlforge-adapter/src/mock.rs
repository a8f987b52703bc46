//! Mock adapter for testing
//!
//! Records every executed statement in order without touching a database.
//! Useful for:
//! - Unit testing the runner's failure policies
//! - Dry runs against the `mock` target type
//! - Simulating connection and statement failures

use crate::adapter::{AdapterError, DatabaseAdapter};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock database adapter
///
/// Statements are recorded in execution order. Failures can be scripted per
/// statement substring, and connection tests can be forced to fail.
///
/// # Example
///
/// ```rust,ignore
/// let adapter = MockAdapter::new()
///     .with_connection_failure()
///     .with_latency(50);
/// ```
pub struct MockAdapter {
    /// Statements executed so far, in order
    executed: Arc<RwLock<Vec<String>>>,

    /// Substring patterns that make a statement fail, with their messages
    failures: Arc<RwLock<Vec<(String, String)>>>,

    /// Tracks whether connect() has been called without a matching close()
    connected: Arc<RwLock<bool>>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Simulate statement latency (milliseconds)
    latency_ms: u64,
}

impl MockAdapter {
    /// Create a mock adapter that accepts everything
    pub fn new() -> Self {
        Self {
            executed: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(Vec::new())),
            connected: Arc::new(RwLock::new(false)),
            fail_connection: false,
            latency_ms: 0,
        }
    }

    /// Configure to fail all connection attempts
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure simulated latency per statement
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Fail any statement containing `pattern` with the given message
    pub async fn fail_statements_containing(
        &self,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.failures
            .write()
            .await
            .push((pattern.into(), message.into()));
    }

    /// Statements executed so far, in order
    pub async fn executed_statements(&self) -> Vec<String> {
        self.executed.read().await.clone()
    }

    /// Number of statements executed
    pub async fn execution_count(&self) -> usize {
        self.executed.read().await.len()
    }

    /// Whether the connection is currently open
    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DatabaseAdapter for MockAdapter {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn connect(&self) -> Result<(), AdapterError> {
        if self.fail_connection {
            return Err(AdapterError::ConnectionError(
                "mock connection failure".to_string(),
            ));
        }
        *self.connected.write().await = true;
        Ok(())
    }

    async fn close(&self) -> Result<(), AdapterError> {
        *self.connected.write().await = false;
        Ok(())
    }

    async fn execute_ddl(&self, sql: &str) -> Result<(), AdapterError> {
        if !*self.connected.read().await {
            return Err(AdapterError::NotConnected);
        }

        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }

        for (pattern, message) in self.failures.read().await.iter() {
            if sql.contains(pattern.as_str()) {
                return Err(AdapterError::ExecutionError(message.clone()));
            }
        }

        self.executed.write().await.push(sql.to_string());
        Ok(())
    }
}
