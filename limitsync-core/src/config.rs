//! Configuration management for limitsync
//!
//! Settings are layered, highest priority first:
//! 1. Command-line flags (applied by the caller)
//! 2. Environment variables
//! 3. Configuration file (TOML format)
//! 4. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::logging::LoggingConfig;
use crate::reconciler::DEFAULT_CALL_TIMEOUT;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsyncConfig {
    /// Input file configuration
    pub input: InputConfig,
    /// Cluster connection configuration
    pub cluster: ClusterConfig,
    /// Reconciliation behaviour
    pub reconcile: ReconcileConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Input file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Comma-separated file of name,namespace,cpu,memory rows
    pub path: PathBuf,
}

/// Cluster connection configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Kubeconfig file; `$HOME/.kube/config` when unset
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context; the current context when unset
    pub context: Option<String>,
}

/// Reconciliation behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Upper bound for each get/update call, in seconds
    pub call_timeout_secs: u64,
    /// Exit non-zero when any record was not applied
    pub fail_on_error: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("metrics.csv"),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: DEFAULT_CALL_TIMEOUT.as_secs(),
            fail_on_error: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    FileRead(PathBuf, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error("HOME is not set and no kubeconfig path was configured")]
    NoHome,
}

impl LimitsyncConfig {
    /// Load configuration from the environment and an optional config file
    ///
    /// `explicit` names a config file that must exist; otherwise the standard
    /// locations are searched and a missing file just means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        };

        let mut config = match path {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            std::env::var("LIMITSYNC_CONFIG").ok().map(PathBuf::from),
            Some(PathBuf::from("./limitsync.toml")),
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".config/limitsync/config.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; unparsable values are ignored
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Input
        if let Some(path) = lookup("LIMITSYNC_INPUT") {
            self.input.path = PathBuf::from(path);
        }

        // Cluster
        if let Some(path) = lookup("LIMITSYNC_KUBECONFIG") {
            self.cluster.kubeconfig = Some(PathBuf::from(path));
        }
        if let Some(context) = lookup("LIMITSYNC_CONTEXT") {
            self.cluster.context = Some(context);
        }

        // Reconcile
        if let Some(secs) = lookup("LIMITSYNC_CALL_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.reconcile.call_timeout_secs = secs;
            }
        }
        if let Some(enabled) = lookup("LIMITSYNC_FAIL_ON_ERROR") {
            if let Ok(enabled) = enabled.parse() {
                self.reconcile.fail_on_error = enabled;
            }
        }

        // Logging
        if let Some(level) = lookup("LIMITSYNC_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(dir) = lookup("LIMITSYNC_LOG_DIR") {
            self.logging.log_dir = Some(PathBuf::from(dir));
        }
    }

    /// Kubeconfig to connect with
    pub fn kubeconfig_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.cluster.kubeconfig {
            return Ok(path.clone());
        }

        let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
        Ok(PathBuf::from(home).join(".kube").join("config"))
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile.call_timeout_secs)
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("Input path cannot be empty".to_string()));
        }

        if self.reconcile.call_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Call timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_behaviour() {
        let config = LimitsyncConfig::default();
        assert_eq!(config.input.path, PathBuf::from("metrics.csv"));
        assert!(config.cluster.kubeconfig.is_none());
        assert_eq!(config.call_timeout(), Duration::from_secs(5));
        assert!(!config.reconcile.fail_on_error);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[input]\npath = \"limits.csv\"\n\n[reconcile]\ncall_timeout_secs = 30"
        )
        .unwrap();

        let config = LimitsyncConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.input.path, PathBuf::from("limits.csv"));
        assert_eq!(config.reconcile.call_timeout_secs, 30);
        assert!(!config.reconcile.fail_on_error);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[reconcile\ncall_timeout_secs = ").unwrap();

        let err = LimitsyncConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = LimitsyncConfig::load(Some(Path::new("/nonexistent/limitsync.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(..)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("LIMITSYNC_INPUT", "/data/rows.csv"),
            ("LIMITSYNC_KUBECONFIG", "/etc/kube/admin.conf"),
            ("LIMITSYNC_CONTEXT", "prod"),
            ("LIMITSYNC_CALL_TIMEOUT_SECS", "12"),
            ("LIMITSYNC_FAIL_ON_ERROR", "true"),
            ("LIMITSYNC_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = LimitsyncConfig::default();
        config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.input.path, PathBuf::from("/data/rows.csv"));
        assert_eq!(
            config.kubeconfig_path().unwrap(),
            PathBuf::from("/etc/kube/admin.conf")
        );
        assert_eq!(config.cluster.context.as_deref(), Some("prod"));
        assert_eq!(config.call_timeout(), Duration::from_secs(12));
        assert!(config.reconcile.fail_on_error);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_unparsable_overrides_are_ignored() {
        let mut config = LimitsyncConfig::default();
        config.apply_overrides_from(|key| match key {
            "LIMITSYNC_CALL_TIMEOUT_SECS" => Some("soon".to_string()),
            "LIMITSYNC_FAIL_ON_ERROR" => Some("maybe".to_string()),
            _ => None,
        });

        assert_eq!(config.reconcile.call_timeout_secs, 5);
        assert!(!config.reconcile.fail_on_error);
    }

    #[test]
    fn test_validation() {
        let mut config = LimitsyncConfig::default();
        config.reconcile.call_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = LimitsyncConfig::default();
        config.input.path = PathBuf::new();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_sample_round_trips() {
        let sample = LimitsyncConfig::generate_sample().unwrap();
        let parsed: LimitsyncConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.input.path, PathBuf::from("metrics.csv"));
    }
}
