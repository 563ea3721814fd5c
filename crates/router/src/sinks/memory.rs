//! MemorySink - keeps routed events in memory

use contracts::{ContractError, EventSink, LogEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// In-memory destination, for tests and embedding
///
/// A failing sink rejects every event, which is how destination errors are
/// exercised.
#[derive(Debug, Default)]
pub struct MemorySink {
    name: String,
    events: Mutex<Vec<LogEvent>>,
    failing: bool,
    flushes: AtomicU64,
    closed: AtomicBool,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sink whose `emit` always fails
    pub fn failing(name: impl Into<String>) -> Self {
        Self {
            failing: true,
            ..Self::new(name)
        }
    }

    /// Copy of the received events, in arrival order
    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().clone()
    }

    /// Rendered messages of the received events
    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(LogEvent::render_message)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl EventSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, event: &LogEvent) -> Result<(), ContractError> {
        if self.failing {
            return Err(ContractError::sink_write(&self.name, "sink rejects all events"));
        }
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn flush(&self) -> Result<(), ContractError> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn close(&self) -> Result<(), ContractError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
