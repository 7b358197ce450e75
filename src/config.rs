use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Generator settings, read from an optional YAML file. CLI flags override these.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Questionnaire to use instead of the bundled one.
    pub questionnaire: Option<PathBuf>,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub security: OperationalDefaults,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            questionnaire: None,
            dry_run: false,
            security: OperationalDefaults::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Operational limits written into every generated `config.yaml`.
/// Not asked by the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OperationalDefaults {
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_timeout")]
    pub timeout: u32,
}

impl Default for OperationalDefaults {
    fn default() -> Self {
        Self {
            rate_limit: default_rate_limit(),
            timeout: default_timeout(),
        }
    }
}

fn default_rate_limit() -> u32 {
    10
}

fn default_timeout() -> u32 {
    30
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: GeneratorConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
