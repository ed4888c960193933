use clap::Parser;
use tracing_subscriber::EnvFilter;

use gsp_solar_api::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")))
        .init();

    let config = gsp_solar_api::config::config().clone();
    tracing::info!("Starting GSP Solar API in {:?} mode", config.environment);

    cli::run(Cli::parse(), config).await
}
