//! Layered error definitions
//!
//! Categorized by source: config / expression / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Expression Errors =====
    /// Expression failed to parse or bind
    #[error("failed to compile expression '{expression}': {message}")]
    ExpressionCompile { expression: String, message: String },

    /// Compiled expression failed against a specific event
    #[error("failed to evaluate expression '{expression}': {message}")]
    ExpressionEvaluation { expression: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Message without the expression or sink prefix
    pub fn detail(&self) -> String {
        match self {
            Self::ExpressionCompile { message, .. }
            | Self::ExpressionEvaluation { message, .. }
            | Self::SinkWrite { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create expression compile error
    pub fn expression_compile(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExpressionCompile {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Create expression evaluation error
    pub fn expression_evaluation(
        expression: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ExpressionEvaluation {
            expression: expression.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
