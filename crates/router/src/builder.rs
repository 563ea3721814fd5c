//! Router construction and wiring

use std::sync::Arc;
use std::time::Duration;

use contracts::{
    ContractError, DestinationId, EventSink, OptionsListener, OptionsSource, PredicateCompiler,
    RouterOptions, SelfLog,
};
use expression::ExpressionEngine;
use observability::TracingSelfLog;
use tracing::{info, instrument};

use crate::error::RouterError;
use crate::metrics::RouterMetrics;
use crate::reconfigure::{ReconfigurationController, RouterSettings};
use crate::router::RouterSink;
use crate::slot::RoutingSlots;

/// Builder for creating a RouterSink
pub struct RouterSinkBuilder {
    source: Arc<dyn OptionsSource>,
    name: String,
    sink_a: Option<Arc<dyn EventSink>>,
    sink_b: Option<Arc<dyn EventSink>>,
    compiler: Arc<dyn PredicateCompiler>,
    self_log: Arc<dyn SelfLog>,
    settings: RouterSettings,
}

impl RouterSinkBuilder {
    /// Builder reading its rules from `source`
    ///
    /// Defaults: the built-in expression engine, `TracingSelfLog`, and a
    /// 100 ms reconfiguration timeout.
    pub fn new(source: Arc<dyn OptionsSource>) -> Self {
        Self {
            source,
            name: "router".to_string(),
            sink_a: None,
            sink_b: None,
            compiler: ExpressionEngine::shared(),
            self_log: Arc::new(TracingSelfLog::new()),
            settings: RouterSettings::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn sink_a(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink_a = Some(sink);
        self
    }

    pub fn sink_b(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink_b = Some(sink);
        self
    }

    pub fn destination(self, destination: DestinationId, sink: Arc<dyn EventSink>) -> Self {
        match destination {
            DestinationId::A => self.sink_a(sink),
            DestinationId::B => self.sink_b(sink),
        }
    }

    pub fn compiler(mut self, compiler: Arc<dyn PredicateCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn self_log(mut self, self_log: Arc<dyn SelfLog>) -> Self {
        self.self_log = self_log;
        self
    }

    pub fn settings(mut self, settings: RouterSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn reconfigure_timeout(mut self, timeout: Duration) -> Self {
        self.settings.reconfigure_timeout = timeout;
        self
    }

    /// Build the router and apply the source's current options
    ///
    /// Both slots start at always-false. The router subscribes first, then
    /// applies `source.current()` synchronously; the initial application is
    /// stamped before subscribing so a change racing with construction
    /// always wins over it.
    ///
    /// # Errors
    /// [`RouterError::InvalidConfiguration`] when a destination is missing.
    #[instrument(name = "router_builder_build", skip(self), fields(router = %self.name))]
    pub fn build(self) -> Result<RouterSink, RouterError> {
        let sink_a = self.sink_a.ok_or(RouterError::InvalidConfiguration {
            destination: DestinationId::A,
        })?;
        let sink_b = self.sink_b.ok_or(RouterError::InvalidConfiguration {
            destination: DestinationId::B,
        })?;

        let slots = Arc::new(RoutingSlots::new());
        let metrics = Arc::new(RouterMetrics::new());
        let controller = Arc::new(ReconfigurationController::new(
            self.compiler,
            Arc::clone(&slots),
            Arc::clone(&metrics),
            Arc::clone(&self.self_log),
            self.settings,
        ));

        let initial_version = controller.next_version();
        let weak = Arc::downgrade(&controller);
        let listener: OptionsListener = Arc::new(move |options: &RouterOptions| {
            if let Some(controller) = weak.upgrade() {
                controller.on_config_change(options);
            }
        });
        let subscription = self.source.subscribe(listener);
        controller.apply(initial_version, &self.source.current());

        let router = RouterSink::new(
            self.name,
            slots,
            controller,
            metrics,
            self.self_log,
            Arc::clone(&sink_a),
            Arc::clone(&sink_b),
            subscription,
        );
        info!(
            sink_a = sink_a.name(),
            sink_b = sink_b.name(),
            active = ?router.active_expressions(),
            "Router started"
        );
        Ok(router)
    }
}

/// Collects the destination built by a configuration callback
#[derive(Default)]
pub struct DestinationConfiguration {
    sink: Option<Arc<dyn EventSink>>,
}

impl DestinationConfiguration {
    /// Route to `sink`; a later call replaces an earlier one
    pub fn sink(&mut self, sink: Arc<dyn EventSink>) -> &mut Self {
        self.sink = Some(sink);
        self
    }
}

/// Wire a router from two destination-construction callbacks
///
/// Each callback receives an empty [`DestinationConfiguration`] and must
/// register exactly the destination it builds. Uses the defaults of
/// [`RouterSinkBuilder::new`].
///
/// # Errors
/// - [`RouterError::SinkCreation`] when a callback fails
/// - [`RouterError::InvalidConfiguration`] when a callback registers nothing
pub fn router_sink<A, B>(
    source: Arc<dyn OptionsSource>,
    configure_a: A,
    configure_b: B,
) -> Result<RouterSink, RouterError>
where
    A: FnOnce(&mut DestinationConfiguration) -> Result<(), ContractError>,
    B: FnOnce(&mut DestinationConfiguration) -> Result<(), ContractError>,
{
    let sink_a = configure(DestinationId::A, configure_a)?;
    let sink_b = configure(DestinationId::B, configure_b)?;
    RouterSinkBuilder::new(source)
        .sink_a(sink_a)
        .sink_b(sink_b)
        .build()
}

fn configure(
    destination: DestinationId,
    callback: impl FnOnce(&mut DestinationConfiguration) -> Result<(), ContractError>,
) -> Result<Arc<dyn EventSink>, RouterError> {
    let mut config = DestinationConfiguration::default();
    callback(&mut config).map_err(|e| RouterError::sink_creation(destination, e.to_string()))?;
    config
        .sink
        .ok_or(RouterError::InvalidConfiguration { destination })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use contracts::{LogEvent, LogLevel, Subscription};
    use parking_lot::Mutex;

    /// Fixed options, remembers whether a listener is attached
    #[derive(Default)]
    struct StaticSource {
        options: RouterOptions,
        listeners: Arc<Mutex<usize>>,
    }

    impl OptionsSource for StaticSource {
        fn current(&self) -> RouterOptions {
            self.options.clone()
        }

        fn subscribe(&self, _listener: OptionsListener) -> Subscription {
            *self.listeners.lock() += 1;
            let listeners = Arc::clone(&self.listeners);
            Subscription::new(move || *listeners.lock() -= 1)
        }
    }

    #[test]
    fn test_missing_destination_is_rejected() {
        let source = Arc::new(StaticSource::default());
        let err = RouterSinkBuilder::new(source)
            .sink_a(Arc::new(MemorySink::new("a")))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RouterError::InvalidConfiguration {
                destination: DestinationId::B
            }
        ));
    }

    #[test]
    fn test_initial_options_applied() {
        let source = Arc::new(StaticSource {
            options: RouterOptions::new("Level >= Warning", ""),
            ..StaticSource::default()
        });
        let listeners = Arc::clone(&source.listeners);
        let router = RouterSinkBuilder::new(source)
            .sink_a(Arc::new(MemorySink::new("a")))
            .sink_b(Arc::new(MemorySink::new("b")))
            .build()
            .unwrap();

        assert_eq!(
            router.active_expressions(),
            RouterOptions::new("Level >= Warning", "false")
        );
        assert_eq!(router.active_version(DestinationId::A), 1);
        assert_eq!(*listeners.lock(), 1);

        drop(router);
        assert_eq!(*listeners.lock(), 0);
    }

    #[test]
    fn test_router_sink_callbacks() {
        let a = Arc::new(MemorySink::new("a"));
        let b = Arc::new(MemorySink::new("b"));
        let source = Arc::new(StaticSource {
            options: RouterOptions::new("true", "Level == Error"),
            ..StaticSource::default()
        });

        let router = router_sink(
            source,
            |config| {
                config.sink(a.clone());
                Ok(())
            },
            |config| {
                config.sink(b.clone());
                Ok(())
            },
        )
        .unwrap();

        router.emit(&LogEvent::new(LogLevel::Information, "hello"));
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }

    #[test]
    fn test_router_sink_callback_errors() {
        let source: Arc<dyn OptionsSource> = Arc::new(StaticSource::default());

        let err = router_sink(
            Arc::clone(&source),
            |_| Err(ContractError::Other("no disk".into())),
            |_| Ok(()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RouterError::SinkCreation {
                destination: DestinationId::A,
                ..
            }
        ));

        let err = router_sink(
            source,
            |config| {
                config.sink(Arc::new(MemorySink::new("a")));
                Ok(())
            },
            |_| Ok(()),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RouterError::InvalidConfiguration {
                destination: DestinationId::B
            }
        ));
    }
}
