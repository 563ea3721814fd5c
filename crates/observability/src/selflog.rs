//! SelfLog 实现
//!
//! - `TracingSelfLog`: 生产用，诊断写入 tracing 并更新指标
//! - `MemorySelfLog`: 内存捕获，用于测试与嵌入

use contracts::{Diagnostic, SelfLog};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::metrics::record_diagnostic;

/// Target used for every self-diagnostic event
pub const SELFLOG_TARGET: &str = "sink_router::selflog";

/// Writes diagnostics as structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSelfLog;

impl TracingSelfLog {
    pub fn new() -> Self {
        Self
    }
}

impl SelfLog for TracingSelfLog {
    fn write(&self, diagnostic: Diagnostic) {
        record_diagnostic(&diagnostic);
        if diagnostic.is_failure() {
            warn!(target: SELFLOG_TARGET, diagnostic = ?diagnostic, "{diagnostic}");
        } else {
            info!(target: SELFLOG_TARGET, diagnostic = ?diagnostic, "{diagnostic}");
        }
    }
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct MemorySelfLog {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySelfLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Only the failure reports
    pub fn failures(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .iter()
            .filter(|d| d.is_failure())
            .cloned()
            .collect()
    }

    /// Number of reports matching `filter`
    pub fn count(&self, filter: impl Fn(&Diagnostic) -> bool) -> usize {
        self.entries.lock().iter().filter(|d| filter(d)).count()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl SelfLog for MemorySelfLog {
    fn write(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::DestinationId;

    #[test]
    fn test_memory_selflog_captures() {
        let log = MemorySelfLog::new();
        assert!(log.is_empty());

        log.write(Diagnostic::ConfigurationChanged { version: 1 });
        log.write(Diagnostic::DestinationEmitFailed {
            destination: DestinationId::B,
            error: "disk full".into(),
        });

        assert_eq!(log.len(), 2);
        assert_eq!(log.failures().len(), 1);
        assert_eq!(
            log.count(|d| matches!(d, Diagnostic::ConfigurationChanged { .. })),
            1
        );

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_tracing_selflog_does_not_panic() {
        let log = TracingSelfLog::new();
        log.write(Diagnostic::ExpressionCompileFailed {
            destination: DestinationId::A,
            version: 2,
            expression: "Level >".into(),
            error: "unexpected end of expression".into(),
        });
    }
}
