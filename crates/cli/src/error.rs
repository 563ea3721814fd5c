//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Expression given on the command line does not compile
    #[error("Invalid expression: {message}")]
    ExpressionCompile { message: String },

    /// Input line is not a valid event
    #[error("Invalid event on line {line}: {message}")]
    InvalidEvent { line: u64, message: String },

    /// Router could not be built
    #[error("Failed to build router: {0}")]
    Router(#[from] router::RouterError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn expression_compile(message: impl Into<String>) -> Self {
        Self::ExpressionCompile {
            message: message.into(),
        }
    }

    pub fn invalid_event(line: u64, message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            line,
            message: message.into(),
        }
    }
}
