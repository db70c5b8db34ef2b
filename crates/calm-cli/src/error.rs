//! CLI error types.

use std::fmt;

use calm_core::WindowError;
use calm_google::{GoogleError, GoogleErrorCode};

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced to the user, one variant per failure category.
#[derive(Debug)]
pub enum CliError {
    /// Missing or unusable local setup (OAuth client, store directory).
    Config(String),
    /// Authorization could not be completed.
    Auth(String),
    /// The request itself was malformed.
    Usage(String),
    /// The calendar API failed or was unreachable.
    Api(String),
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Auth(msg) => write!(f, "authentication error: {}", msg),
            Self::Usage(msg) => write!(f, "usage error: {}", msg),
            Self::Api(msg) => write!(f, "API error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<GoogleError> for CliError {
    fn from(err: GoogleError) -> Self {
        match err.code() {
            GoogleErrorCode::Configuration => Self::Config(err.message().to_string()),
            GoogleErrorCode::Authentication => Self::Auth(err.message().to_string()),
            _ => Self::Api(err.to_string()),
        }
    }
}

impl From<WindowError> for CliError {
    fn from(err: WindowError) -> Self {
        Self::Usage(err.to_string())
    }
}
