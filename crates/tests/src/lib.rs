//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置监视 -> 表达式编译 -> 路由 的完整链路
//! - 并发 emit 与热更新
//! - 配置文件热加载

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_default_deny_expression() {
        let options = contracts::RouterOptions::default().normalized();
        assert_eq!(
            options.should_emit_sink_a_expression,
            contracts::DEFAULT_DENY_EXPRESSION
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use config_loader::{FileOptionsWatcher, OptionsMonitor};
    use contracts::{Diagnostic, LogEvent, LogLevel, RouterOptions};
    use observability::MemorySelfLog;
    use router::{router_sink, MemorySink, RouterSink, RouterSinkBuilder};

    struct Harness {
        monitor: OptionsMonitor,
        router: RouterSink,
        sink_a: Arc<MemorySink>,
        sink_b: Arc<MemorySink>,
        self_log: Arc<MemorySelfLog>,
    }

    fn harness(options: RouterOptions) -> Harness {
        let monitor = OptionsMonitor::new(options);
        let sink_a = Arc::new(MemorySink::new("a"));
        let sink_b = Arc::new(MemorySink::new("b"));
        let self_log = Arc::new(MemorySelfLog::new());

        let router = RouterSinkBuilder::new(Arc::new(monitor.clone()))
            .sink_a(sink_a.clone())
            .sink_b(sink_b.clone())
            .self_log(self_log.clone())
            .build()
            .unwrap();

        Harness {
            monitor,
            router,
            sink_a,
            sink_b,
            self_log,
        }
    }

    fn event(level: LogLevel, message: &str) -> LogEvent {
        LogEvent::new(level, message)
    }

    /// Monitor -> compile -> route, then a live reconfiguration
    #[test]
    fn test_e2e_route_and_reconfigure() {
        let h = harness(RouterOptions::new(
            "Level >= Warning",
            r#"Properties.ContainsKey("audit")"#,
        ));

        h.router.emit(&event(LogLevel::Error, "disk failed"));
        h.router
            .emit(&event(LogLevel::Information, "login").with_property("audit", true));
        h.router.emit(&event(LogLevel::Debug, "tick"));

        assert_eq!(h.sink_a.messages(), vec!["disk failed"]);
        assert_eq!(h.sink_b.messages(), vec!["login"]);

        h.monitor
            .set(RouterOptions::new("", r#"MessageTemplate.Text.StartsWith("tick")"#));

        h.router.emit(&event(LogLevel::Fatal, "crash"));
        h.router.emit(&event(LogLevel::Debug, "tick 2"));

        assert_eq!(h.sink_a.len(), 1);
        assert_eq!(h.sink_b.messages(), vec!["login", "tick 2"]);
        assert_eq!(h.router.active_expressions().should_emit_sink_a_expression, "false");
        assert!(h
            .self_log
            .count(|d| matches!(d, Diagnostic::ReconfigurationApplied { .. }))
            >= 2);
    }

    /// A bad expression in a later configuration keeps the previous rule for that sink only
    #[test]
    fn test_e2e_malformed_update_keeps_prior_rule() {
        let h = harness(RouterOptions::new("Level >= Error", "true"));

        h.monitor.set(RouterOptions::new("Level >=", "false"));

        h.router.emit(&event(LogLevel::Error, "boom"));
        assert_eq!(h.sink_a.len(), 1);
        assert_eq!(h.sink_b.len(), 0);

        let failures = h.self_log.failures();
        assert!(failures
            .iter()
            .any(|d| matches!(d, Diagnostic::ExpressionCompileFailed { .. })));
        assert_eq!(h.router.metrics().compile_failures, 1);
    }

    /// Evaluation errors forward the event; a broken sink never affects the other
    #[test]
    fn test_e2e_fail_open_and_destination_isolation() {
        let monitor = OptionsMonitor::new(RouterOptions::new(
            r#"Properties["Percent"] > 90"#,
            "true",
        ));
        let sink_a = Arc::new(MemorySink::failing("a"));
        let sink_b = Arc::new(MemorySink::new("b"));
        let self_log = Arc::new(MemorySelfLog::new());

        let router = RouterSinkBuilder::new(Arc::new(monitor))
            .sink_a(sink_a.clone())
            .sink_b(sink_b.clone())
            .self_log(self_log.clone())
            .build()
            .unwrap();

        router.emit(&event(LogLevel::Information, "no percent"));

        assert_eq!(sink_b.len(), 1);
        assert_eq!(
            self_log.count(|d| matches!(d, Diagnostic::ExpressionEvaluationFailed { .. })),
            1
        );
        assert_eq!(
            self_log.count(|d| matches!(d, Diagnostic::DestinationEmitFailed { .. })),
            1
        );
        let snapshot = router.metrics();
        assert_eq!(snapshot.a.fail_open, 1);
        assert_eq!(snapshot.a.failures, 1);
    }

    /// Emitting threads keep routing while the rules are swapped underneath them
    #[test]
    fn test_e2e_concurrent_emit_during_reconfiguration() {
        let h = Arc::new(harness(RouterOptions::new("true", "false")));
        let stop = Arc::new(AtomicBool::new(false));
        let emitted = Arc::new(AtomicU64::new(0));

        let emitters: Vec<_> = (0..4)
            .map(|_| {
                let h = h.clone();
                let stop = stop.clone();
                let emitted = emitted.clone();
                thread::spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        h.router.emit(&event(LogLevel::Information, "e"));
                        emitted.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();

        for i in 0..50 {
            let options = if i % 2 == 0 {
                RouterOptions::new("false", "true")
            } else {
                RouterOptions::new("true", "false")
            };
            h.monitor.set(options);
        }

        stop.store(true, Ordering::Relaxed);
        for emitter in emitters {
            emitter.join().unwrap();
        }

        // every emit evaluated both destinations; none was lost to a swap
        let total = emitted.load(Ordering::Relaxed);
        let snapshot = h.router.metrics();
        assert_eq!(snapshot.a.evaluated, total);
        assert_eq!(snapshot.b.evaluated, total);
        assert_eq!(snapshot.a.forwarded, h.sink_a.len() as u64);
        assert_eq!(snapshot.b.forwarded, h.sink_b.len() as u64);
        assert_eq!(snapshot.a.fail_open + snapshot.b.fail_open, 0);
        assert_eq!(snapshot.abandoned_reconfigurations, 0);

        // last configuration wins
        let last = h.router.active_expressions();
        assert_eq!(last.should_emit_sink_a_expression, "true");
        assert_eq!(last.should_emit_sink_b_expression, "false");
    }

    /// Changes pushed from two threads reach the router in the order they were written
    #[test]
    fn test_e2e_concurrent_sets_apply_in_order() {
        use contracts::OptionsSource;
        use std::sync::mpsc;

        let monitor = OptionsMonitor::new(RouterOptions::new("true", ""));
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = std::sync::Mutex::new(release_rx);

        // subscribed before the router, so it runs first and holds up one change
        let _stall = monitor.subscribe(Arc::new(move |options: &RouterOptions| {
            if options.should_emit_sink_a_expression == "Level == Debug" {
                let _ = entered_tx.send(());
                if let Ok(rx) = release_rx.lock() {
                    let _ = rx.recv();
                }
            }
        }));

        let router = RouterSinkBuilder::new(Arc::new(monitor.clone()))
            .sink_a(Arc::new(MemorySink::new("a")))
            .sink_b(Arc::new(MemorySink::new("b")))
            .reconfigure_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        let first = {
            let monitor = monitor.clone();
            thread::spawn(move || monitor.set(RouterOptions::new("Level == Debug", "")))
        };
        entered_rx.recv().unwrap();
        let second = {
            let monitor = monitor.clone();
            thread::spawn(move || monitor.set(RouterOptions::new("Level == Error", "")))
        };
        thread::sleep(Duration::from_millis(50));
        release_tx.send(()).unwrap();
        first.join().unwrap();
        second.join().unwrap();

        assert_eq!(monitor.current().should_emit_sink_a_expression, "Level == Error");
        assert_eq!(
            router.active_expressions().should_emit_sink_a_expression,
            "Level == Error"
        );
    }

    /// Editing the watched file reconfigures the running router
    #[test]
    fn test_e2e_file_hot_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.toml");
        std::fs::write(
            &path,
            "[Router]\nShouldEmitSinkAExpression = \"Level >= Error\"\n",
        )
        .unwrap();

        let (monitor, watcher) =
            FileOptionsWatcher::watch(&path, Duration::from_millis(20)).unwrap();
        let sink_a = Arc::new(MemorySink::new("a"));
        let sink_b = Arc::new(MemorySink::new("b"));
        let router = router_sink(
            Arc::new(monitor),
            |a| {
                a.sink(sink_a.clone());
                Ok(())
            },
            |b| {
                b.sink(sink_b.clone());
                Ok(())
            },
        )
        .unwrap();

        router.emit(&event(LogLevel::Warning, "before"));
        assert!(sink_a.is_empty());
        assert!(sink_b.is_empty());

        std::fs::write(
            &path,
            "[Router]\nShouldEmitSinkAExpression = \"Level >= Warning\"\nShouldEmitSinkBExpression = \"true\"\n",
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while router.active_expressions().should_emit_sink_b_expression != "true" {
            assert!(Instant::now() < deadline, "configuration was not reloaded");
            thread::sleep(Duration::from_millis(10));
        }

        router.emit(&event(LogLevel::Warning, "after"));
        assert_eq!(sink_a.messages(), vec!["after"]);
        assert_eq!(sink_b.messages(), vec!["after"]);

        watcher.stop();
        router.close();
        assert!(sink_a.is_closed());
        assert!(sink_b.is_closed());
    }
}
