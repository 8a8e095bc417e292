//! Instrumented task list service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum + tower-http middleware)
//!                          │
//!                          ▼
//!                     http::handlers ──▶ Telemetry::instrument ──▶ store::TaskStore
//!                                              │
//!                        ┌─────────────────────┼─────────────────────┐
//!                        ▼                     ▼                     ▼
//!                   TraceSink             MetricSink              LogSink
//!                 (span per op)     (counter + histogram)   (span-correlated)
//!                        │                     │                     │
//!                        └──────── OTLP/HTTP collector (or Prometheus) ┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use todo_service::config::{load_or_default, validate_config, ConfigError};
use todo_service::lifecycle;

#[derive(Parser)]
#[command(name = "todo-service")]
#[command(about = "Task list service with correlated traces, metrics and logs", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    lifecycle::run(config).await?;
    Ok(())
}
