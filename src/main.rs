use std::sync::Arc;

use clap::Parser;
use linkgate::api::{AppState, create_router};
use linkgate::config::{CONFIG, Config};
use tracing_subscriber::EnvFilter;

/// Search proxy that drops dead share links from backend results.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Listen address
    #[arg(long)]
    bind: Option<String>,
    /// Search backend base URL
    #[arg(long)]
    search_api_url: Option<String>,
    /// Link validator endpoint
    #[arg(long)]
    check_api_url: Option<String>,
    /// End-to-end timeout for outbound calls, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Cli {
    fn apply(self, base: &Config) -> Config {
        Config {
            bind_addr: self.bind.unwrap_or_else(|| base.bind_addr.clone()),
            search_api_url: self
                .search_api_url
                .unwrap_or_else(|| base.search_api_url.clone()),
            check_api_url: self
                .check_api_url
                .unwrap_or_else(|| base.check_api_url.clone()),
            request_timeout_secs: self.timeout_secs.unwrap_or(base.request_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Bridge log crate -> tracing (so log::info! etc. work)
    tracing_log::LogTracer::init()?;

    let config = Cli::parse().apply(&CONFIG);
    tracing::info!(
        search_api = %config.search_api_url,
        check_api = %config.check_api_url,
        timeout_secs = config.request_timeout_secs,
        "starting linkgate"
    );

    let state = Arc::new(AppState::from_config(&config)?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutting down");
}
