use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use application::RetentionPolicy;
use chrono::Utc;
use clap::{Parser, Subcommand};
use infrastructure::config::RetentionConfig;
use infrastructure::{JwtAuthenticator, ServerConfig, database};
use migration::{Migrator, MigratorTrait};
use sea_orm::SqlxPostgresConnector;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use hub_server::api;
use hub_server::state::{AppState, Stores};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding `default.*` and `<RUN_MODE>.*` config files
    #[arg(long, default_value = "config")]
    config_dir: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Keep everything in process memory instead of PostgreSQL
        #[arg(long)]
        in_memory: bool,
    },
    /// Apply pending schema migrations
    Migrate,
    /// Delete rows older than the configured retention windows
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hub_server=debug,application=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(&args.config_dir)
        .with_context(|| format!("loading configuration from {}", args.config_dir))?;

    match args.command {
        Command::Serve { in_memory } => serve(config, in_memory).await,
        Command::Migrate => migrate(config).await,
        Command::Purge => purge(config).await,
    }
}

fn retention_policy(config: RetentionConfig) -> RetentionPolicy {
    RetentionPolicy {
        action_days: config.action_days,
        telemetry_days: config.telemetry_days,
        audit_days: config.audit_days,
    }
}

async fn serve(config: ServerConfig, in_memory: bool) -> Result<()> {
    info!("🏠 Device Hub Starting...");
    let authenticator = Arc::new(JwtAuthenticator::new(config.jwt_secret()?));

    let stores = if in_memory {
        warn!("Running with in-memory stores; nothing survives a restart");
        Stores::in_memory()
    } else {
        let pool = database::connect(&config.database)
            .await
            .context("connecting to PostgreSQL")?;
        Stores::postgres(pool)
    };

    let state = Arc::new(AppState::new(
        stores,
        authenticator,
        retention_policy(config.retention),
    ));
    let app = api::create_router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("🚀 API Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn migrate(config: ServerConfig) -> Result<()> {
    let pool = database::connect(&config.database).await?;
    let db = SqlxPostgresConnector::from_sqlx_postgres_pool(pool);

    info!("Running database migrations...");
    Migrator::up(&db, None).await?;
    info!("✅ Migrations applied successfully");
    Ok(())
}

async fn purge(config: ServerConfig) -> Result<()> {
    let pool = database::connect(&config.database).await?;
    let policy = retention_policy(config.retention);

    // The purge never authenticates anyone; no secret is needed.
    let state = AppState::new(
        Stores::postgres(pool),
        Arc::new(JwtAuthenticator::new("")),
        policy,
    );

    let report = state.retention.run(Utc::now()).await?;
    info!(
        actions = report.actions,
        readings = report.readings,
        audit_entries = report.audit_entries,
        ?policy,
        "🧹 Retention purge finished"
    );
    Ok(())
}
