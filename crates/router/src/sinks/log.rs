//! LogSink - writes routed events via tracing

use contracts::{ContractError, EventSink, LogEvent, LogLevel};
use tracing::{debug, error, info, instrument, warn};

/// Sink that logs every event it receives
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl EventSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, event: &LogEvent) -> Result<(), ContractError> {
        let message = event.render_message();
        let timestamp = event.timestamp.to_rfc3339();
        match event.level {
            LogLevel::Verbose | LogLevel::Debug => {
                debug!(sink = %self.name, %timestamp, level = %event.level, "{message}")
            }
            LogLevel::Information => {
                info!(sink = %self.name, %timestamp, level = %event.level, "{message}")
            }
            LogLevel::Warning => {
                warn!(sink = %self.name, %timestamp, level = %event.level, "{message}")
            }
            LogLevel::Error | LogLevel::Fatal => error!(
                sink = %self.name,
                %timestamp,
                level = %event.level,
                exception = event.exception.as_deref().unwrap_or(""),
                "{message}"
            ),
        }
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    fn close(&self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
