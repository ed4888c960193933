use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use crate::app::app;
use crate::auth::{generate_jwt, Claims};
use crate::config::{AppConfig, Environment};
use crate::database::fake::make_fake_data;
use crate::database::{DatabaseManager, ForecastStore, MemoryStore, PgStore};
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "gsp-solar-api")]
#[command(about = "Solar forecast and PV_Live API for GB Grid Supply Points")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API (default)")]
    Serve {
        #[arg(long, help = "Port to listen on, overriding GSP_API_PORT")]
        port: Option<u16>,
        #[arg(long, help = "Serve generated fake data from memory instead of Postgres")]
        fake: bool,
        #[arg(long, default_value_t = 10, help = "Number of fake GSPs (ids 0..N) when --fake is set")]
        fake_gsp_count: i32,
    },

    #[command(about = "Apply database migrations")]
    Migrate,

    #[command(about = "Write fake forecasts and PV_Live yields for gsp ids 0..N to the database")]
    Seed {
        #[arg(long, default_value_t = 10)]
        gsp_count: i32,
    },

    #[command(about = "Mint a bearer token signed with the configured JWT secret")]
    Token {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Commands::Serve {
        port: None,
        fake: false,
        fake_gsp_count: 10,
    });

    match command {
        Commands::Serve { port, fake, fake_gsp_count } => serve(config, port, fake, fake_gsp_count).await,
        Commands::Migrate => {
            let mut database = config.database.clone();
            database.run_migrations = false;
            let pool = DatabaseManager::connect(&database).await?;
            DatabaseManager::migrate(&pool).await?;
            Ok(())
        }
        Commands::Seed { gsp_count } => {
            let pool = DatabaseManager::connect(&config.database).await?;
            let data = make_fake_data(0..gsp_count, Utc::now());
            PgStore::new(pool).seed(&data).await?;
            Ok(())
        }
        Commands::Token { subject, email, hours } => {
            let claims = Claims::new(subject, email, hours, &config.security);
            println!("{}", generate_jwt(&claims, &config.security)?);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, port: Option<u16>, fake: bool, fake_gsp_count: i32) -> anyhow::Result<()> {
    anyhow::ensure!(
        !config.security.jwt_secret.is_empty(),
        "JWT_SECRET must be set outside development"
    );

    let store: Arc<dyn ForecastStore> = if fake {
        anyhow::ensure!(
            config.environment != Environment::Production,
            "--fake is not available in production"
        );
        info!("Serving fake data for {} gsps from memory", fake_gsp_count);
        Arc::new(MemoryStore::with_fake_data(0..fake_gsp_count))
    } else {
        let pool = DatabaseManager::connect(&config.database).await?;
        Arc::new(PgStore::new(pool))
    };

    let bind_addr = format!("{}:{}", config.server.host, port.unwrap_or(config.server.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("GSP Solar API listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(config, store)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
