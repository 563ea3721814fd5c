//! Reconfiguration controller
//!
//! Turns a configuration change into freshly compiled predicates:
//! 1. stamp the change with a version at initiation
//! 2. wait (bounded) for the reconfiguration lock
//! 3. normalize, then compile and publish A and B independently
//!
//! A failed compile leaves that destination's slot untouched.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{
    CompiledPredicate, ContractError, DestinationId, Diagnostic, PredicateCompiler, RouterOptions,
    SelfLog,
};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::metrics::RouterMetrics;
use crate::slot::RoutingSlots;

/// Default bounded wait for the reconfiguration lock
pub const DEFAULT_RECONFIGURE_TIMEOUT: Duration = Duration::from_millis(100);

/// Router tuning knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterSettings {
    /// How long a reconfiguration waits for a running one before giving up
    pub reconfigure_timeout: Duration,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            reconfigure_timeout: DEFAULT_RECONFIGURE_TIMEOUT,
        }
    }
}

/// Result of one reconfiguration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconfigureOutcome {
    /// Lock acquired and both expressions processed
    Applied {
        version: u64,
        published: usize,
        failed: usize,
        superseded: usize,
    },
    /// Lock not acquired within the timeout
    Abandoned { version: u64 },
}

impl ReconfigureOutcome {
    pub fn version(&self) -> u64 {
        match self {
            Self::Applied { version, .. } | Self::Abandoned { version } => *version,
        }
    }
}

enum SlotOutcome {
    Published,
    Superseded,
    Failed,
}

/// Serializes configuration changes and publishes into the slots
pub(crate) struct ReconfigurationController {
    compiler: Arc<dyn PredicateCompiler>,
    slots: Arc<RoutingSlots>,
    metrics: Arc<RouterMetrics>,
    self_log: Arc<dyn SelfLog>,
    timeout: Duration,
    versions: AtomicU64,
    lock: Mutex<()>,
}

impl ReconfigurationController {
    pub(crate) fn new(
        compiler: Arc<dyn PredicateCompiler>,
        slots: Arc<RoutingSlots>,
        metrics: Arc<RouterMetrics>,
        self_log: Arc<dyn SelfLog>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            compiler,
            slots,
            metrics,
            self_log,
            timeout: settings.reconfigure_timeout,
            versions: AtomicU64::new(0),
            lock: Mutex::new(()),
        }
    }

    /// Stamp a new reconfiguration; versions start at 1
    pub(crate) fn next_version(&self) -> u64 {
        self.versions.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Change-listener entry point
    pub(crate) fn on_config_change(&self, options: &RouterOptions) -> ReconfigureOutcome {
        let version = self.next_version();
        self.apply(version, options)
    }

    /// Apply `options` under the version stamped at initiation
    #[instrument(name = "router_reconfigure", skip(self, options))]
    pub(crate) fn apply(&self, version: u64, options: &RouterOptions) -> ReconfigureOutcome {
        let started = Instant::now();
        let Some(_guard) = self.lock.try_lock_for(self.timeout) else {
            let waited = started.elapsed();
            warn!(version, waited_ms = waited.as_millis() as u64, "Reconfiguration abandoned");
            self.metrics.inc_abandoned();
            self.self_log
                .write(Diagnostic::ReconfigurationAbandoned { version, waited });
            return ReconfigureOutcome::Abandoned { version };
        };

        self.self_log
            .write(Diagnostic::ConfigurationChanged { version });

        let options = options.normalized();
        let (mut published, mut failed, mut superseded) = (0, 0, 0);
        for destination in DestinationId::BOTH {
            match self.update_slot(version, destination, options.expression(destination)) {
                SlotOutcome::Published => published += 1,
                SlotOutcome::Failed => failed += 1,
                SlotOutcome::Superseded => superseded += 1,
            }
        }

        let elapsed = started.elapsed();
        self.metrics.record_reconfiguration(elapsed);
        observability::record_reconfiguration_duration_ms(elapsed.as_secs_f64() * 1000.0);
        self.self_log.write(Diagnostic::ReconfigurationApplied {
            version,
            published,
            failed,
        });
        info!(version, published, failed, superseded, "Router reconfigured");

        ReconfigureOutcome::Applied {
            version,
            published,
            failed,
            superseded,
        }
    }

    fn update_slot(&self, version: u64, destination: DestinationId, text: &str) -> SlotOutcome {
        let predicate = match self.compile(text) {
            Ok(predicate) => predicate,
            Err(err) => {
                let error = err.detail();
                warn!(%destination, version, expression = %text, %error, "Expression rejected");
                self.metrics.inc_compile_failures();
                self.self_log.write(Diagnostic::ExpressionCompileFailed {
                    destination,
                    version,
                    expression: text.to_string(),
                    error,
                });
                return SlotOutcome::Failed;
            }
        };

        if self.slots.get(destination).publish(version, predicate) {
            debug!(%destination, version, expression = %text, "Expression published");
            self.self_log.write(Diagnostic::ExpressionCompiled {
                destination,
                version,
                expression: text.to_string(),
            });
            SlotOutcome::Published
        } else {
            debug!(%destination, version, "Expression superseded");
            self.self_log
                .write(Diagnostic::ExpressionSuperseded {
                    destination,
                    version,
                });
            SlotOutcome::Superseded
        }
    }

    /// Compile through the injected compiler; a panic counts as a compile error
    fn compile(&self, text: &str) -> Result<CompiledPredicate, ContractError> {
        catch_unwind(AssertUnwindSafe(|| self.compiler.compile(text))).unwrap_or_else(|panic| {
            Err(ContractError::expression_compile(
                text,
                format!("compiler panicked: {}", crate::panic_message(panic.as_ref())),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{LogEvent, LogLevel};
    use expression::ExpressionEngine;
    use observability::MemorySelfLog;
    use std::thread;

    fn controller(timeout: Duration) -> (ReconfigurationController, Arc<RoutingSlots>, Arc<MemorySelfLog>) {
        let slots = Arc::new(RoutingSlots::new());
        let log = Arc::new(MemorySelfLog::new());
        let controller = ReconfigurationController::new(
            ExpressionEngine::shared(),
            Arc::clone(&slots),
            Arc::new(RouterMetrics::new()),
            log.clone(),
            RouterSettings {
                reconfigure_timeout: timeout,
            },
        );
        (controller, slots, log)
    }

    fn source(slots: &RoutingSlots, destination: DestinationId) -> String {
        slots.get(destination).read().predicate.source().to_string()
    }

    #[test]
    fn test_publishes_both_and_normalizes_empty() {
        let (controller, slots, log) = controller(DEFAULT_RECONFIGURE_TIMEOUT);
        let outcome = controller.on_config_change(&RouterOptions::new("Level >= Warning", "  "));

        assert_eq!(
            outcome,
            ReconfigureOutcome::Applied {
                version: 1,
                published: 2,
                failed: 0,
                superseded: 0
            }
        );
        assert_eq!(source(&slots, DestinationId::A), "Level >= Warning");
        assert_eq!(source(&slots, DestinationId::B), "false");
        assert!(log.failures().is_empty());
    }

    #[test]
    fn test_compile_failure_keeps_previous_rule() {
        let (controller, slots, log) = controller(DEFAULT_RECONFIGURE_TIMEOUT);
        controller.on_config_change(&RouterOptions::new("Level >= Warning", "true"));
        let outcome = controller.on_config_change(&RouterOptions::new("Level >=", "Level == Error"));

        assert!(matches!(
            outcome,
            ReconfigureOutcome::Applied {
                published: 1,
                failed: 1,
                ..
            }
        ));
        assert_eq!(source(&slots, DestinationId::A), "Level >= Warning");
        assert_eq!(source(&slots, DestinationId::B), "Level == Error");
        assert_eq!(
            log.count(|d| matches!(
                d,
                Diagnostic::ExpressionCompileFailed {
                    destination: DestinationId::A,
                    version: 2,
                    ..
                }
            )),
            1
        );
    }

    #[test]
    fn test_stale_version_is_superseded() {
        let (controller, slots, log) = controller(DEFAULT_RECONFIGURE_TIMEOUT);
        let older = controller.next_version();
        let newer = controller.next_version();

        controller.apply(newer, &RouterOptions::new("true", "true"));
        let outcome = controller.apply(older, &RouterOptions::new("false", "false"));

        assert!(matches!(
            outcome,
            ReconfigureOutcome::Applied {
                published: 0,
                superseded: 2,
                ..
            }
        ));
        assert_eq!(source(&slots, DestinationId::A), "true");
        assert_eq!(
            log.count(|d| matches!(d, Diagnostic::ExpressionSuperseded { .. })),
            2
        );
    }

    #[test]
    fn test_abandons_when_lock_held() {
        let (controller, slots, log) = controller(Duration::from_millis(20));
        let controller = Arc::new(controller);

        let guard = controller.lock.lock();
        let worker = {
            let controller = Arc::clone(&controller);
            thread::spawn(move || controller.on_config_change(&RouterOptions::new("true", "true")))
        };
        let outcome = worker.join().unwrap();
        drop(guard);

        assert!(matches!(outcome, ReconfigureOutcome::Abandoned { .. }));
        assert_eq!(source(&slots, DestinationId::A), "false");
        assert_eq!(
            log.count(|d| matches!(d, Diagnostic::ReconfigurationAbandoned { .. })),
            1
        );
    }

    struct PanickingCompiler;

    impl PredicateCompiler for PanickingCompiler {
        fn compile(&self, _text: &str) -> Result<CompiledPredicate, ContractError> {
            panic!("compiler bug")
        }
    }

    #[test]
    fn test_compiler_panic_is_a_compile_failure() {
        let slots = Arc::new(RoutingSlots::new());
        let log = Arc::new(MemorySelfLog::new());
        let controller = ReconfigurationController::new(
            Arc::new(PanickingCompiler),
            Arc::clone(&slots),
            Arc::new(RouterMetrics::new()),
            log.clone(),
            RouterSettings::default(),
        );

        controller.on_config_change(&RouterOptions::new("true", "true"));

        let event = LogEvent::new(LogLevel::Error, "x");
        assert!(!slots
            .get(DestinationId::A)
            .read()
            .predicate
            .evaluate(&event)
            .unwrap());
        assert_eq!(
            log.count(|d| matches!(d, Diagnostic::ExpressionCompileFailed { .. })),
            2
        );
    }
}
