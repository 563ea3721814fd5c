//! EventSink trait - Router output interface
//!
//! Defines the abstract interface for destinations.

use std::fmt;

use crate::{ContractError, LogEvent};

/// Event destination trait
///
/// All destination implementations must implement this trait. `emit` is
/// called synchronously on the producing thread and may be called from
/// several threads at once.
pub trait EventSink: Send + Sync {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Accept one event
    ///
    /// # Errors
    /// Returns write error (should include context)
    fn emit(&self, event: &LogEvent) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    fn flush(&self) -> Result<(), ContractError> {
        Ok(())
    }

    /// Release resources held by the sink
    fn close(&self) -> Result<(), ContractError> {
        Ok(())
    }
}

/// One of the router's two destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DestinationId {
    A,
    B,
}

impl DestinationId {
    /// Both destinations, in routing order
    pub const BOTH: [DestinationId; 2] = [DestinationId::A, DestinationId::B];

    /// Short label used for metrics
    pub fn label(&self) -> &'static str {
        match self {
            DestinationId::A => "a",
            DestinationId::B => "b",
        }
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationId::A => f.write_str("sink A"),
            DestinationId::B => f.write_str("sink B"),
        }
    }
}
