//! Router error types

use contracts::DestinationId;
use thiserror::Error;

/// Router construction errors
///
/// Nothing on the event path returns these; `emit` never fails.
#[derive(Debug, Error)]
pub enum RouterError {
    /// A destination was not configured
    #[error("invalid router configuration: {destination} is not configured")]
    InvalidConfiguration { destination: DestinationId },

    /// A destination could not be created
    #[error("failed to create {destination}: {message}")]
    SinkCreation {
        destination: DestinationId,
        message: String,
    },
}

impl RouterError {
    /// Create a sink creation error
    pub fn sink_creation(destination: DestinationId, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            destination,
            message: message.into(),
        }
    }
}
