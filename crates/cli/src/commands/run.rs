//! `run` command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use config_loader::{FileOptionsWatcher, OptionsMonitor};
use contracts::{DestinationId, EventSink};
use observability::TracingSelfLog;
use router::{FileSink, FileSinkConfig, LogSink, RouterError, RouterSink, RouterSinkBuilder};

use super::input::{open_async_input, parse_event};
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::stats::RunStats;

/// Lower bound for the config polling interval
const MIN_WATCH_INTERVAL: Duration = Duration::from_millis(10);

/// Execute the `run` command
pub async fn run_router(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let interval = Duration::from_millis(args.watch_interval_ms).max(MIN_WATCH_INTERVAL);
    let (monitor, watcher) = FileOptionsWatcher::watch(&args.config, interval)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let router = build_router(args, monitor)?;
    info!(
        sink_a = ?router.active_expressions().should_emit_sink_a_expression,
        sink_b = ?router.active_expressions().should_emit_sink_b_expression,
        "Router ready"
    );

    let input = open_async_input(args.input.as_deref())
        .await
        .context("Failed to open event input")?;

    let started = Instant::now();
    let mut stats = RunStats::default();

    tokio::select! {
        result = route_lines(input, &router, &mut stats) => {
            result.context("Failed to read event input")?;
            info!(lines = stats.lines_read, "Input exhausted");
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping router...");
        }
    }

    watcher.stop();
    router.close();

    stats.duration = started.elapsed();
    stats.router = router.metrics();
    stats.print_summary();

    info!("Sink Router finished");
    Ok(())
}

/// Build the router over the watched options
fn build_router(args: &RunArgs, monitor: OptionsMonitor) -> Result<RouterSink, CliError> {
    let sink_a = open_destination(DestinationId::A, args.sink_a.as_deref())?;
    let sink_b = open_destination(DestinationId::B, args.sink_b.as_deref())?;

    let router = RouterSinkBuilder::new(Arc::new(monitor))
        .name("sink-router")
        .sink_a(sink_a)
        .sink_b(sink_b)
        .self_log(Arc::new(TracingSelfLog::new()))
        .reconfigure_timeout(Duration::from_millis(args.reconfigure_timeout_ms))
        .build()?;
    Ok(router)
}

/// JSON-lines file when a path is given, log output otherwise
fn open_destination(
    destination: DestinationId,
    path: Option<&Path>,
) -> Result<Arc<dyn EventSink>, RouterError> {
    let name = format!("sink-{}", destination.label());
    match path {
        Some(path) => {
            let sink = FileSink::new(name, FileSinkConfig::new(path))
                .map_err(|e| RouterError::sink_creation(destination, e.to_string()))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(LogSink::new(name))),
    }
}

/// Route every line of `input`; invalid lines are logged and skipped
async fn route_lines<R>(input: R, router: &RouterSink, stats: &mut RunStats) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        stats.lines_read += 1;
        match parse_event(stats.lines_read, &line) {
            Ok(Some(event)) => {
                router.emit(&event);
                stats.events_routed += 1;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Skipping input line");
                stats.invalid_lines += 1;
            }
        }
    }
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const EVENTS: &str = concat!(
        r#"{"timestamp":"2024-05-01T12:00:00Z","level":"Information","message_template":"hello"}"#,
        "\n",
        r#"{"timestamp":"2024-05-01T12:00:01Z","level":"Error","message_template":"boom","properties":{"audit":true}}"#,
        "\n",
        "not json\n",
        "\n",
    );

    fn run_args(dir: &Path) -> RunArgs {
        RunArgs {
            config: dir.join("router.toml"),
            input: None,
            sink_a: Some(dir.join("a.jsonl")),
            sink_b: Some(dir.join("b.jsonl")),
            watch_interval_ms: 50,
            reconfigure_timeout_ms: 100,
            metrics_port: 0,
        }
    }

    #[tokio::test]
    async fn test_route_lines_to_files() {
        let dir = tempdir().unwrap();
        let args = run_args(dir.path());
        let monitor = OptionsMonitor::new(config_loader::RouterOptions::new(
            "Level >= Warning",
            r#"Properties.ContainsKey("audit")"#,
        ));

        let router = build_router(&args, monitor).unwrap();
        let mut stats = RunStats::default();
        route_lines(EVENTS.as_bytes(), &router, &mut stats)
            .await
            .unwrap();
        router.close();

        assert_eq!(stats.lines_read, 4);
        assert_eq!(stats.events_routed, 2);
        assert_eq!(stats.invalid_lines, 1);

        let a = fs::read_to_string(dir.path().join("a.jsonl")).unwrap();
        let b = fs::read_to_string(dir.path().join("b.jsonl")).unwrap();
        assert_eq!(a.lines().count(), 1);
        assert_eq!(b.lines().count(), 1);
        assert!(a.contains("boom"));
    }

    #[tokio::test]
    async fn test_run_reads_input_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("router.toml"),
            "ShouldEmitSinkAExpression = \"true\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("events.jsonl"), EVENTS).unwrap();

        let mut args = run_args(dir.path());
        args.input = Some(dir.path().join("events.jsonl"));
        run_router(&args).await.unwrap();

        let a = fs::read_to_string(dir.path().join("a.jsonl")).unwrap();
        assert_eq!(a.lines().count(), 2);
        let b = fs::read_to_string(dir.path().join("b.jsonl")).unwrap();
        assert!(b.is_empty());
    }

    #[tokio::test]
    async fn test_missing_config() {
        let dir = tempdir().unwrap();
        let err = run_router(&run_args(dir.path())).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
