//! SQLForge Core
//!
//! Project configuration (sqlforge.toml) and the stable run-report schema
//! shared by the runner and the CLI.

pub mod config;
pub mod report;

pub use config::{Config, ConfigError, TargetConfig};
pub use report::{ModelResult, ModelStatus, ReportVersion, RunReport, RunSummary};
