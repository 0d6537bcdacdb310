mod config;
mod http;
mod seed;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use platform_authn::{DbSessionBackend, SessionBackend};
use platform_obs::{ObsConfig, init_tracing, shutdown_tracing};
use platform_store::{EmployeeStore, HttpEmployeeStore, MemoryEmployeeStore};
use tracing::info;

use crate::{
    config::{AppConfig, RecordStoreTarget},
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "portal-server", version, about = "LeafCorp personnel portal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Run session database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Insert the demo employees into the record store.
    Seed,
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    let app_config = Arc::new(AppConfig::load()?);
    let outcome = match cli.command {
        Command::Serve(cmd) => run_server(cmd, app_config).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up(&app_config).await,
            MigrateCommand::Down => migrate_down(&app_config).await,
        },
        Command::Seed => run_seed(&app_config).await,
    };
    shutdown_tracing();
    outcome
}

fn record_store(config: &AppConfig) -> Result<Arc<dyn EmployeeStore>> {
    let store: Arc<dyn EmployeeStore> = match &config.record_store {
        RecordStoreTarget::Http(base) => Arc::new(HttpEmployeeStore::new(base)?),
        RecordStoreTarget::Memory => {
            info!("using the in-process record store; records are lost on exit");
            Arc::new(MemoryEmployeeStore::new())
        }
    };
    Ok(store)
}

async fn session_backend(config: &AppConfig) -> Result<DbSessionBackend> {
    DbSessionBackend::connect(&config.session_database_url).await
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let backend = session_backend(&config).await?;
    ensure_migrations(&backend, cmd.allow_dirty).await?;
    let store = record_store(&config)?;
    if config.record_store == RecordStoreTarget::Memory {
        seed::seed_demo_employees(store.as_ref()).await?;
    }
    let backend: Arc<dyn SessionBackend> = Arc::new(backend);
    let state = AppState::build(config, store, backend).await;
    http::serve((&cmd).into(), state).await
}

async fn ensure_migrations(backend: &DbSessionBackend, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(backend.connection()).await?;
    if !pending.is_empty() && !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `portal-server migrate up` or pass --allow-dirty"
        );
    }
    Ok(())
}

async fn migrate_up(config: &AppConfig) -> Result<()> {
    let backend = session_backend(config).await?;
    Migrator::up(backend.connection(), None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down(config: &AppConfig) -> Result<()> {
    let backend = session_backend(config).await?;
    Migrator::down(backend.connection(), Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}

async fn run_seed(config: &AppConfig) -> Result<()> {
    let store = record_store(config)?;
    let created = seed::seed_demo_employees(store.as_ref())
        .await
        .context("seeding demo employees failed")?;
    info!(created, "seed complete");
    Ok(())
}
