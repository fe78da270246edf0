//! CLI error types and conversions

use crate::collector::CollectError;
use crate::config::ConfigError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Collection error
    #[error("collection error: {0}")]
    CollectError(#[from] CollectError),
}
