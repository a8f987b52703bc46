//! Run report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Terminal state of one executed model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Succeeded,
    Failed,
}

/// Outcome of one model in a run
///
/// Only attempted models appear in a report; models skipped by an early
/// fail-fast abort are absent, not marked failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    /// Node identifier (e.g. "model.users")
    pub id: String,

    /// Terminal state
    pub status: ModelStatus,

    /// Error detail if failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelResult {
    /// Record a success
    pub fn succeeded(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: ModelStatus::Succeeded,
            error: None,
        }
    }

    /// Record a failure with its error detail
    pub fn failed(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: ModelStatus::Failed,
            error: Some(error.into()),
        }
    }
}

/// Summary statistics for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of models attempted
    pub attempted: usize,

    /// Number of models that succeeded
    pub succeeded: usize,

    /// Number of models that failed
    pub failed: usize,
}

/// Run report (run-report.json v1)
///
/// This is the stable output format.
/// All fields are versioned and backward-compatible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Target the run executed against
    pub target: String,

    /// Summary statistics
    pub summary: RunSummary,

    /// Per-model results, in execution order
    pub results: Vec<ModelResult>,
}

impl RunReport {
    /// Create a new empty report for a target
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            target: target.into(),
            summary: RunSummary::default(),
            results: Vec::new(),
        }
    }

    /// Record a model outcome
    pub fn add_result(&mut self, result: ModelResult) {
        self.summary.attempted += 1;
        match result.status {
            ModelStatus::Succeeded => self.summary.succeeded += 1,
            ModelStatus::Failed => self.summary.failed += 1,
        }
        self.results.push(result);
    }

    /// Check if any attempted model failed
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report() {
        let report = RunReport::new("dev");
        assert_eq!(report.version, ReportVersion::CURRENT);
        assert_eq!(report.summary.attempted, 0);
        assert!(!report.has_failures());
    }

    #[test]
    fn report_counts_outcomes() {
        let mut report = RunReport::new("dev");
        report.add_result(ModelResult::succeeded("model.users"));
        report.add_result(ModelResult::failed("model.orders", "relation missing"));

        assert_eq!(report.summary.attempted, 2);
        assert_eq!(report.summary.succeeded, 1);
        assert_eq!(report.summary.failed, 1);
        assert!(report.has_failures());
    }

    #[test]
    fn report_serialization() {
        let mut report = RunReport::new("dev");
        report.add_result(ModelResult::succeeded("model.users"));

        let json = report.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"succeeded\""));
        assert!(json.contains("model.users"));
        // failed models carry an error field, successes omit it
        assert!(!json.contains("\"error\""));
    }
}
