//! Expression error types

use thiserror::Error;

use crate::lexer::Span;

/// Error raised while lexing, parsing or binding an expression
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at line {line}, col {col}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl ParseError {
    /// Create an error located at `span`
    pub fn at(span: Span, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: span.line,
            col: span.col,
        }
    }
}

/// Error raised while evaluating a bound expression against one event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EvalError(pub String);

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
