//! # Sink Router CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与表达式校验
//! - 事件路由与配置热加载
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod stats;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_eval, run_router, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(observability_config(&cli))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Sink Router CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_router(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Eval(args) => run_eval(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Logging and metrics settings from CLI options
fn observability_config(cli: &Cli) -> ObservabilityConfig {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let metrics_port = match &cli.command {
        Commands::Run(args) if args.metrics_port != 0 => Some(args.metrics_port),
        _ => None,
    };

    ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port,
        default_log_level: default_log_level.to_string(),
    }
}
