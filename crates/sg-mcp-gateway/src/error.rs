// error.rs — Error types for the MCP gateway.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while starting or configuring the gateway.
///
/// Per-request failures never surface here: the tool handlers convert
/// them into deny responses so one bad request cannot take down the
/// server process.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The policy validator failed to load its knowledge base.
    #[error("validator error: {0}")]
    Validator(#[from] sg_policy::ValidatorError),

    /// No config file was found at the explicit path, the SEMGATE_CONFIG
    /// location, or ./semgate.yaml.
    #[error("config file not found; create semgate.yaml or set SEMGATE_CONFIG")]
    ConfigNotFound,

    /// The config file exists but is not valid YAML.
    #[error("invalid config {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
