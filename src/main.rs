//! Health snapshot server binary entry point.
//!
//! This binary provides a stdio-based MCP server for metrics snapshots.
//! All logs go to stderr; stdout is reserved for MCP JSON-RPC messages.
//!
//! Coverage is excluded because the main function cannot be unit tested
//! as it requires the full MCP protocol handshake over stdio.

// Enable the coverage attribute when running with nightly for llvm-cov exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use health_snapshots::config::{Config, LogFormat, DEFAULT_LOG_LEVEL};
use health_snapshots::server::McpServer;
use tracing_subscriber::filter::EnvFilter;

#[cfg_attr(coverage_nightly, coverage(off))]
fn init_tracing(level: &str, format: LogFormat) {
    let filter = level
        .parse::<EnvFilter>()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[tokio::main]
async fn main() {
    let loaded = Config::from_env();
    match &loaded {
        Ok(config) => init_tracing(&config.log_level, config.log_format),
        Err(_) => init_tracing(DEFAULT_LOG_LEVEL, LogFormat::Text),
    }

    tracing::info!("health-snapshots starting...");

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        database = %config.database_path,
        source = %config.source_database_path,
        timeout_ms = config.request_timeout_ms,
        "configuration loaded"
    );

    let server = McpServer::new(config);
    if let Err(e) = server.run_stdio().await {
        tracing::error!(kind = %e.kind(), "Server error: {e}");
        std::process::exit(1);
    }

    tracing::info!("health-snapshots shutdown complete");
}
