//! Self-diagnostic channel
//!
//! Operator-facing reports produced by the router. Never surfaced as errors
//! to the code that emits events.

use std::fmt;
use std::time::Duration;

use crate::DestinationId;

/// One self-diagnostic report
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A configuration change was received
    ConfigurationChanged { version: u64 },

    /// An expression compiled and was published
    ExpressionCompiled {
        destination: DestinationId,
        version: u64,
        expression: String,
    },

    /// An expression failed to compile; the previous rule stays active
    ExpressionCompileFailed {
        destination: DestinationId,
        version: u64,
        expression: String,
        error: String,
    },

    /// A compiled expression was superseded before it could be published
    ExpressionSuperseded {
        destination: DestinationId,
        version: u64,
    },

    /// A predicate failed for one event; the event was forwarded anyway
    ExpressionEvaluationFailed {
        destination: DestinationId,
        expression: String,
        error: String,
    },

    /// A reconfiguration finished; `failed` destinations kept their rule
    ReconfigurationApplied {
        version: u64,
        published: usize,
        failed: usize,
    },

    /// The reconfiguration lock was not acquired in time
    ReconfigurationAbandoned { version: u64, waited: Duration },

    /// A destination rejected an event
    DestinationEmitFailed {
        destination: DestinationId,
        error: String,
    },

    /// A destination failed to flush or close
    DestinationCloseFailed {
        destination: DestinationId,
        error: String,
    },
}

impl Diagnostic {
    /// Whether this report describes a failure
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            Diagnostic::ConfigurationChanged { .. }
                | Diagnostic::ExpressionCompiled { .. }
                | Diagnostic::ExpressionSuperseded { .. }
                | Diagnostic::ReconfigurationApplied { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ConfigurationChanged { version } => {
                write!(f, "router configuration change detected (version {version})")
            }
            Diagnostic::ExpressionCompiled {
                destination,
                version,
                expression,
            } => write!(
                f,
                "parsed expression for {destination} (version {version}): {expression}"
            ),
            Diagnostic::ExpressionCompileFailed {
                destination,
                version,
                expression,
                error,
            } => write!(
                f,
                "error parsing expression for {destination} (version {version}): {expression}: {error}"
            ),
            Diagnostic::ExpressionSuperseded {
                destination,
                version,
            } => write!(
                f,
                "expression for {destination} (version {version}) superseded by a newer change"
            ),
            Diagnostic::ExpressionEvaluationFailed {
                destination,
                expression,
                error,
            } => write!(
                f,
                "error evaluating expression for {destination}: {expression}: {error}"
            ),
            Diagnostic::ReconfigurationApplied {
                version,
                published,
                failed,
            } => write!(
                f,
                "reconfiguration (version {version}) applied: {published} published, {failed} failed"
            ),
            Diagnostic::ReconfigurationAbandoned { version, waited } => write!(
                f,
                "reconfiguration (version {version}) abandoned after waiting {}ms for the lock",
                waited.as_millis()
            ),
            Diagnostic::DestinationEmitFailed { destination, error } => {
                write!(f, "{destination} failed to accept event: {error}")
            }
            Diagnostic::DestinationCloseFailed { destination, error } => {
                write!(f, "{destination} failed to close: {error}")
            }
        }
    }
}

/// Diagnostic output channel
///
/// Injected into the router at construction.
pub trait SelfLog: Send + Sync {
    /// Record one report
    fn write(&self, diagnostic: Diagnostic);
}
