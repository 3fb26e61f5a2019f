//! Voxcrm server binary
//!
//! Entry point for the agent service: loads configuration, initializes
//! tracing, bootstraps shared state, and serves the router.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use voxcrm::cli::Cli;
use voxcrm::config::Config;
use voxcrm::server;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse_args();

    let config_path = cli.config.as_deref().unwrap_or("config/voxcrm.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    let state = server::bootstrap(config)?;
    let listen = state.config.server.listen.clone();
    let router = server::build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    tracing::info!("voxcrm listening on {}", listen);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Initialize tracing subscriber with environment filter
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("voxcrm=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
