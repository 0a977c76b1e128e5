//! swiftmock -- in-memory OpenStack Swift server for integration tests.
//!
//! State is never persisted: every start is a fresh, single-account store.
//! SIGTERM/SIGINT stop accepting connections and let in-flight requests
//! finish.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use swiftmock::config::{self, Config};

/// Command-line arguments for the swiftmock server.
#[derive(Parser, Debug)]
#[command(
    name = "swiftmock",
    version,
    about = "In-memory OpenStack Swift object storage server"
)]
struct Cli {
    /// Path to the YAML configuration file. Built-in defaults apply when
    /// omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Override the bind address (host:port).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };

    init_tracing(&config);
    match &cli.config {
        Some(path) => info!("Loaded configuration from {}", path),
        None => info!("No configuration file given, using defaults"),
    }

    let bind_addr = cli
        .bind
        .unwrap_or_else(|| format!("{}:{}", config.server.host, config.server.port));

    if config.observability.metrics {
        swiftmock::metrics::init_metrics();
        swiftmock::metrics::describe_metrics();
        info!("Prometheus metrics initialized");
    }

    info!(
        "Seeding account {} (temp URL key {})",
        config.account.name,
        if config.account.temp_url_key.is_some() {
            "configured"
        } else {
            "not configured"
        }
    );
    let state = Arc::new(swiftmock::AppState::new(config.clone()));
    let app = swiftmock::server::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(
        "swiftmock listening on {} (storage URL {}/v1/AUTH_{})",
        bind_addr,
        config.server.public_url(),
        config.account.name
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("swiftmock shut down");

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Wait for SIGTERM or SIGINT (Ctrl+C), then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        },
    }
}
