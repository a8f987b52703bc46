//! Configuration schema (sqlforge.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn default_models_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_target() -> String {
    "dev".to_string()
}

/// Connection configuration for one execution target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Adapter type (mock, postgres, ...)
    #[serde(rename = "type")]
    pub adapter_type: String,

    /// Connection settings (adapter-specific)
    #[serde(flatten)]
    pub settings: HashMap<String, String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            adapter_type: "mock".to_string(),
            settings: HashMap::new(),
        }
    }
}

impl TargetConfig {
    /// Get a connection setting by key
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(|s| s.as_str())
    }

    /// The schema models are materialized into, if configured
    pub fn schema(&self) -> Option<&str> {
        self.setting("schema")
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory containing model SQL files
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Target used when none is selected on the command line
    #[serde(default = "default_target")]
    pub default_target: String,

    /// Project variables available to templates
    #[serde(default)]
    pub vars: HashMap<String, String>,

    /// Execution targets keyed by name
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let mut targets = HashMap::new();
        targets.insert("dev".to_string(), TargetConfig::default());

        Self {
            models_dir: default_models_dir(),
            default_target: default_target(),
            vars: HashMap::new(),
            targets,
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Resolve a target by name
    pub fn target(&self, name: &str) -> Result<&TargetConfig, ConfigError> {
        self.targets
            .get(name)
            .ok_or_else(|| ConfigError::UnknownTarget(name.to_string()))
    }

    /// Models directory resolved against the project root
    pub fn resolved_models_dir(&self) -> PathBuf {
        if self.models_dir.is_absolute() {
            self.models_dir.clone()
        } else {
            self.project_root.join(&self.models_dir)
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Unknown target '{0}' (not present in [targets])")]
    UnknownTarget(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.models_dir, PathBuf::from("models"));
        assert_eq!(config.default_target, "dev");
        assert!(config.targets.contains_key("dev"));
    }

    #[test]
    fn parse_targets_with_flattened_settings() {
        let toml = r#"
            models_dir = "transforms"
            default_target = "prod"

            [vars]
            start_date = "2020-01-01"

            [targets.prod]
            type = "postgres"
            host = "db.internal"
            dbname = "analytics"
            schema = "marts"
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.models_dir, PathBuf::from("transforms"));
        assert_eq!(config.default_target, "prod");
        assert_eq!(config.vars.get("start_date").unwrap(), "2020-01-01");

        let prod = config.target("prod").unwrap();
        assert_eq!(prod.adapter_type, "postgres");
        assert_eq!(prod.setting("host"), Some("db.internal"));
        assert_eq!(prod.schema(), Some("marts"));
    }

    #[test]
    fn unknown_target_errors() {
        let config = Config::default();
        assert!(matches!(
            config.target("staging"),
            Err(ConfigError::UnknownTarget(_))
        ));
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.models_dir, parsed.models_dir);
        assert_eq!(config.default_target, parsed.default_target);
    }

    #[test]
    fn from_file_sets_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlforge.toml");
        std::fs::write(&path, "models_dir = \"models\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.project_root, dir.path());
        assert_eq!(config.resolved_models_dir(), dir.path().join("models"));
    }
}
