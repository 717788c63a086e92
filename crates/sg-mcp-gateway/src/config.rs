// config.rs — Gateway configuration.
//
// The gateway reads a small YAML file naming the knowledge base to
// enforce. A relative ontology_path is resolved against the directory of
// the config file itself, so a config checked in next to its knowledge
// base keeps working from any working directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Environment variable naming the config file location.
pub const CONFIG_ENV_VAR: &str = "SEMGATE_CONFIG";

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "semgate.yaml";

/// Configuration for the MCP gateway server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Path to the knowledge base file to enforce.
    pub ontology_path: PathBuf,

    /// Log filter directive (e.g., "info", "sg_policy=debug").
    #[serde(default)]
    pub log_level: Option<String>,
}

impl GatewayConfig {
    /// Load configuration, resolving the file in order: the explicit
    /// `path` argument, then `SEMGATE_CONFIG`, then `./semgate.yaml`.
    pub fn load(path: Option<&Path>) -> Result<Self, GatewayError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_location().ok_or(GatewayError::ConfigNotFound)?,
        };
        if !path.exists() {
            return Err(GatewayError::ConfigNotFound);
        }
        Self::from_file(&path)
    }

    /// Parse a config file, resolving a relative ontology_path against
    /// the config file's directory.
    pub fn from_file(path: &Path) -> Result<Self, GatewayError> {
        tracing::info!(path = %path.display(), "loading gateway config");
        let text = std::fs::read_to_string(path)?;
        let mut config: GatewayConfig =
            serde_yaml::from_str(&text).map_err(|e| GatewayError::Config {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if config.ontology_path.is_relative() {
            if let Some(dir) = path.parent() {
                config.ontology_path = dir.join(&config.ontology_path);
            }
        }
        Ok(config)
    }

    fn default_location() -> Option<PathBuf> {
        if let Ok(from_env) = std::env::var(CONFIG_ENV_VAR) {
            let candidate = PathBuf::from(from_env);
            if candidate.exists() {
                return Some(candidate);
            }
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some(local)
    }
}
