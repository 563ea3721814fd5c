//! RouterSink - evaluates both predicates per event and forwards

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{
    ContractError, DestinationId, Diagnostic, EventSink, LogEvent, RouterOptions, SelfLog,
    Subscription,
};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::metrics::{RouterMetrics, RouterMetricsSnapshot};
use crate::reconfigure::{ReconfigurationController, ReconfigureOutcome};
use crate::slot::{Published, RoutingSlots};

/// Conditional dual-destination router
///
/// Each event is checked against the rule for sink A and the rule for sink B
/// independently; it reaches every destination whose rule holds. Rules are
/// replaced at runtime by the configuration source without blocking `emit`.
///
/// Failure policy:
/// - an unset rule never forwards (default-deny)
/// - a rule that errors or panics on an event forwards it (fail-open)
/// - destination errors are reported on the self-diagnostic channel only
pub struct RouterSink {
    name: String,
    slots: Arc<RoutingSlots>,
    controller: Arc<ReconfigurationController>,
    metrics: Arc<RouterMetrics>,
    self_log: Arc<dyn SelfLog>,
    sink_a: Arc<dyn EventSink>,
    sink_b: Arc<dyn EventSink>,
    subscription: Mutex<Option<Subscription>>,
    closed: AtomicBool,
}

impl RouterSink {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        slots: Arc<RoutingSlots>,
        controller: Arc<ReconfigurationController>,
        metrics: Arc<RouterMetrics>,
        self_log: Arc<dyn SelfLog>,
        sink_a: Arc<dyn EventSink>,
        sink_b: Arc<dyn EventSink>,
        subscription: Subscription,
    ) -> Self {
        Self {
            name,
            slots,
            controller,
            metrics,
            self_log,
            sink_a,
            sink_b,
            subscription: Mutex::new(Some(subscription)),
            closed: AtomicBool::new(false),
        }
    }

    /// Route one event
    ///
    /// Never fails and never blocks on reconfiguration. Events emitted after
    /// [`close`](Self::close) are dropped.
    pub fn emit(&self, event: &LogEvent) {
        if self.closed.load(Ordering::Acquire) {
            self.metrics.inc_dropped_after_close();
            return;
        }
        self.route(DestinationId::A, event);
        self.route(DestinationId::B, event);
    }

    fn destination(&self, destination: DestinationId) -> &dyn EventSink {
        match destination {
            DestinationId::A => self.sink_a.as_ref(),
            DestinationId::B => self.sink_b.as_ref(),
        }
    }

    fn route(&self, destination: DestinationId, event: &LogEvent) {
        let published = self.slots.get(destination).read();
        let counters = self.metrics.destination(destination);
        counters.inc_evaluated();

        let forward = self.decide(destination, &published, event);
        observability::record_event_routed(destination, forward);
        debug!(
            router = %self.name,
            %destination,
            version = published.version,
            level = %event.level,
            forward,
            "Routing decision"
        );
        if !forward {
            return;
        }

        counters.inc_forwarded();
        if let Err(e) = self.destination(destination).emit(event) {
            counters.inc_failures();
            self.self_log.write(Diagnostic::DestinationEmitFailed {
                destination,
                error: e.to_string(),
            });
        }
    }

    /// Evaluate one predicate; errors and panics count as `true`
    fn decide(&self, destination: DestinationId, published: &Published, event: &LogEvent) -> bool {
        let error = match catch_unwind(AssertUnwindSafe(|| published.predicate.evaluate(event))) {
            Ok(Ok(matched)) => return matched,
            Ok(Err(e)) => e.detail(),
            Err(panic) => format!("predicate panicked: {}", crate::panic_message(panic.as_ref())),
        };

        self.metrics.destination(destination).inc_fail_open();
        self.self_log.write(Diagnostic::ExpressionEvaluationFailed {
            destination,
            expression: published.predicate.source().to_string(),
            error,
        });
        true
    }

    /// Apply `options` directly, as if the source had pushed them
    pub fn reconfigure(&self, options: &RouterOptions) -> ReconfigureOutcome {
        self.controller.on_config_change(options)
    }

    /// Expressions currently published in the two slots
    pub fn active_expressions(&self) -> RouterOptions {
        RouterOptions::new(
            self.slots.get(DestinationId::A).read().predicate.source(),
            self.slots.get(DestinationId::B).read().predicate.source(),
        )
    }

    /// Version of the predicate currently visible for `destination`
    pub fn active_version(&self, destination: DestinationId) -> u64 {
        self.slots.get(destination).version()
    }

    pub fn metrics(&self) -> RouterMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop listening for changes, then flush and close both destinations
    ///
    /// Idempotent; also runs on drop.
    #[instrument(name = "router_close", skip(self), fields(router = %self.name))]
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.cancel();
        }

        for destination in DestinationId::BOTH {
            let sink = self.destination(destination);
            let result = sink.flush().and(sink.close());
            if let Err(e) = result {
                warn!(%destination, error = %e, "Destination close failed");
                self.self_log.write(Diagnostic::DestinationCloseFailed {
                    destination,
                    error: e.to_string(),
                });
            }
        }

        info!(router = %self.name, "Router closed");
    }
}

impl EventSink for RouterSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, event: &LogEvent) -> Result<(), ContractError> {
        RouterSink::emit(self, event);
        Ok(())
    }

    fn flush(&self) -> Result<(), ContractError> {
        for destination in DestinationId::BOTH {
            if let Err(e) = self.destination(destination).flush() {
                self.self_log.write(Diagnostic::DestinationCloseFailed {
                    destination,
                    error: e.to_string(),
                });
            }
        }
        Ok(())
    }

    fn close(&self) -> Result<(), ContractError> {
        RouterSink::close(self);
        Ok(())
    }
}

impl Drop for RouterSink {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for RouterSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterSink")
            .field("name", &self.name)
            .field("sink_a", &self.sink_a.name())
            .field("sink_b", &self.sink_b.name())
            .field("active", &self.active_expressions())
            .field("closed", &self.is_closed())
            .finish()
    }
}
