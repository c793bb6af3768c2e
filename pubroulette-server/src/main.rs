//! HTTP service answering "which pub next?" for a location and radius.

mod api;
mod app;
mod config;

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::AppState;
use crate::config::ServerConfig;

/// Command-line arguments; each overrides the matching config file value.
#[derive(Parser, Debug)]
#[command(name = "pubroulette", version, about = "Pick a random nearby pub")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "PUBROULETTE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "PUBROULETTE_BIND")]
    bind: Option<SocketAddr>,

    /// Exclusion store: a sqlite URL or `memory`
    #[arg(long, env = "PUBROULETTE_STORE")]
    store: Option<String>,

    /// Google Places API key
    #[arg(long, env = "PUBROULETTE_PLACES_API_KEY", hide_env_values = true)]
    places_api_key: Option<String>,
}

impl Args {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(store) = self.store {
            config.store.url = store;
        }
        if let Some(key) = self.places_api_key {
            config.geodata.places_api_key = Some(key);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    // HTTP + service setup
    let client = Client::builder()
        .user_agent(concat!("pubroulette/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()?;
    let state = AppState::from_config(&config, client).await?;
    let app = api::router(state, &config.server.allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.bind))?;
    info!(addr = %config.server.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received ctrl-c, shutting down"),
        () = terminate => info!("received terminate signal, shutting down"),
    }
}
