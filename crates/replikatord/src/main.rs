//! replikatord — the Replikator API daemon.
//!
//! Serves a REST API over `replikator-ctl` plus a Prometheus `/metrics`
//! endpoint. Each request runs the tool as a child process; calls for the
//! same replikator are serialized.
//!
//! # Usage
//!
//! ```text
//! replikatord --listen :8080 --replikator "sudo replikator-ctl"
//! replikatord --config /etc/replikator-api.toml --log-format json
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use replikator_api::{ApiState, build_router};
use replikator_core::ServerConfig;
use replikator_exec::ProcessGateway;

const DEFAULT_LOG_FILTER: &str = "info,replikatord=debug,replikator=debug";

#[derive(Parser)]
#[command(
    name = "replikatord",
    version,
    about = "Restful Replikator API server",
    long_about = "Restful Replikator API server that allows you to list, create, delete and fetch replikators"
)]
struct Cli {
    /// Listen address, `host:port` or `:port` [default: :8080].
    #[arg(short, long)]
    listen: Option<String>,

    /// Command used to run replikator-ctl [default: "sudo replikator-ctl"].
    #[arg(short, long)]
    replikator: Option<String>,

    /// TOML config file. Command-line flags take precedence over it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_config(cli: Cli) -> anyhow::Result<ServerConfig> {
    let base = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    let config = base.with_overrides(cli.listen, cli.replikator);
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = load_config(cli).context("invalid configuration")?;
    serve(config).await
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let gateway = ProcessGateway::new(&config.replikator)?;
    let state = ApiState::new(Arc::new(gateway)).context("failed to register metrics")?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, replikator = %config.replikator, "Replikator API listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Replikator API stopped");
    Ok(())
}

/// Resolve on the first of SIGINT, SIGTERM, SIGHUP or SIGQUIT.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let received = {
        use tokio::signal::unix::SignalKind;

        tokio::select! {
            name = ctrl_c => name,
            name = unix_signal(SignalKind::terminate(), "SIGTERM") => name,
            name = unix_signal(SignalKind::hangup(), "SIGHUP") => name,
            name = unix_signal(SignalKind::quit(), "SIGQUIT") => name,
        }
    };

    #[cfg(not(unix))]
    let received = ctrl_c.await;

    info!(signal = received, "shutting down, draining in-flight requests");
}

#[cfg(unix)]
async fn unix_signal(kind: tokio::signal::unix::SignalKind, name: &'static str) -> &'static str {
    match tokio::signal::unix::signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            warn!(signal = name, error = %e, "failed to install signal handler");
            std::future::pending::<()>().await;
        }
    }
    name
}
