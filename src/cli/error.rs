//! CLI error types and conversions

use crate::collector::CollectError;
use crate::settings::SettingsError;

/// Exit code for failures before any collection starts
pub const SETUP_EXIT_CODE: i32 = 2;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(#[from] SettingsError),

    /// Collection failed
    #[error("{0}")]
    CollectError(#[from] CollectError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Reading the username prompt failed
    #[error("failed to read username: {0}")]
    PromptError(#[from] std::io::Error),

    /// Metrics exporter could not be installed
    #[error("metrics error: {0}")]
    MetricsError(String),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::CollectError(e) => e.kind().exit_code(),
            _ => SETUP_EXIT_CODE,
        }
    }
}
