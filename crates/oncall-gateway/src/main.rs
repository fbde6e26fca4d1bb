use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use oncall_core::config::OncallConfig;
use tracing::{info, warn};

mod app;
mod http;
mod parse;

/// HTTP service answering "who is on call for this team right now".
#[derive(Parser, Debug)]
#[command(name = "oncall-gateway", version, about = "On-call schedule service")]
struct Cli {
    /// Path to oncall.toml (defaults to ./oncall.toml when present).
    #[arg(long, env = "ONCALL_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "oncall_gateway=info,oncall_schedules=info,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // config: --config / ONCALL_CONFIG > ./oncall.toml, then ONCALL_* env overrides
    let config = load_config(cli.config.as_deref())?;

    let store = oncall_schedules::open_store(&config.storage)
        .with_context(|| format!("opening {} schedule store", config.storage.backend))?;

    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.listen_addr()))?;

    let backend = store.backend();
    let state = Arc::new(app::AppState::new(config, store));
    let router = app::build_router(state);

    info!(%backend, "oncall gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("oncall gateway stopped");
    Ok(())
}

/// Load config, refusing to start on a malformed file or env value. A missing
/// file is not an error; figment treats it as empty.
fn load_config(path: Option<&str>) -> anyhow::Result<OncallConfig> {
    OncallConfig::load(path).with_context(|| {
        format!(
            "loading config from {}",
            path.unwrap_or(oncall_core::config::DEFAULT_CONFIG_PATH)
        )
    })
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
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
    info!("shutdown signal received, draining connections");
}
