//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sink Router - conditional dual-destination log event router
#[derive(Parser, Debug)]
#[command(
    name = "sink-router",
    author,
    version,
    about = "Conditional dual-destination log event router",
    long_about = "Routes JSON-line log events to two destinations.\n\n\
                  Each destination has its own boolean expression over the event \n\
                  (level, message template, properties, exception). Expressions are \n\
                  reloaded from the configuration file while the router runs."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SINK_ROUTER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SINK_ROUTER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route events from a JSON-lines stream
    Run(RunArgs),

    /// Validate configuration file and compile both expressions
    Validate(ValidateArgs),

    /// Evaluate one expression against JSON-line events
    Eval(EvalArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON), watched for changes
    #[arg(
        short,
        long,
        default_value = "router.toml",
        env = "SINK_ROUTER_CONFIG"
    )]
    pub config: PathBuf,

    /// JSON-lines event input (default: stdin)
    #[arg(short, long, env = "SINK_ROUTER_INPUT")]
    pub input: Option<PathBuf>,

    /// JSON-lines output for sink A (default: log)
    #[arg(long, env = "SINK_ROUTER_SINK_A")]
    pub sink_a: Option<PathBuf>,

    /// JSON-lines output for sink B (default: log)
    #[arg(long, env = "SINK_ROUTER_SINK_B")]
    pub sink_b: Option<PathBuf>,

    /// Config file polling interval in milliseconds
    #[arg(long, default_value = "500", env = "SINK_ROUTER_WATCH_INTERVAL_MS")]
    pub watch_interval_ms: u64,

    /// How long a reconfiguration waits for a running one, in milliseconds
    #[arg(long, default_value = "100", env = "SINK_ROUTER_RECONFIGURE_TIMEOUT_MS")]
    pub reconfigure_timeout_ms: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "SINK_ROUTER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "router.toml", env = "SINK_ROUTER_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `eval` command
#[derive(Parser, Debug)]
pub struct EvalArgs {
    /// Expression to evaluate
    #[arg(short, long)]
    pub expression: String,

    /// JSON-lines event input (default: stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
