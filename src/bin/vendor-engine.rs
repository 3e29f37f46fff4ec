//! Vendor pricing engine CLI entry point.
//!
//! Three subcommands:
//! - `serve`: run the HTTP control plane plus the repricing scheduler.
//! - `migrate`: create/upgrade the schema and seed default config rows.
//! - `reprice`: run a single repricing tick against the configured store
//!   and exit (useful for cron-driven deployments and scripted tests).

use anyhow::Result;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vendor_pricing_engine::cache::PriceCache;
use vendor_pricing_engine::catalog::Catalog;
use vendor_pricing_engine::config::ServerConfig;
use vendor_pricing_engine::executor::TransactionExecutor;
use vendor_pricing_engine::http::{build_router, AppState};
use vendor_pricing_engine::ledger::Ledger;
use vendor_pricing_engine::pressure::PressureAccumulator;
use vendor_pricing_engine::pricing::PricingEngine;
use vendor_pricing_engine::session::SessionRegistry;
use vendor_pricing_engine::settings::EngineSettings;
use vendor_pricing_engine::store::{SqliteStore, Store};

#[derive(Parser, Debug)]
#[command(name = "vendor-engine")]
#[command(about = "NPC vendor dynamic pricing engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the settings JSON file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP control plane and the repricing scheduler.
    Serve,
    /// Create/upgrade the schema and seed default config rows.
    Migrate,
    /// Run a single repricing tick and exit.
    Reprice,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            if let Some(engine_error) = e.downcast_ref::<vendor_pricing_engine::EngineError>() {
                tracing::error!(error = %e, "engine exiting with fault");
                std::process::ExitCode::from(engine_error.exit_code() as u8)
            } else {
                tracing::error!(error = %e, "engine exiting with config error");
                std::process::ExitCode::from(1)
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = EngineSettings::load(cli.config.as_deref())?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&settings.db_path)?);
    let config = Arc::new(ServerConfig::new(store.clone()));
    config.seed_defaults_with(&[("base_online_players", settings.base_online_players.to_string())])?;

    match cli.command {
        Commands::Migrate => {
            info!("schema created and defaults seeded");
            Ok(())
        }
        Commands::Reprice => {
            let engine = build_pricing_engine(store.clone(), config, &settings)?;
            engine.reprice_tick().await?;
            info!("single repricing tick complete");
            Ok(())
        }
        Commands::Serve => serve(store, config, settings).await,
    }
}

fn build_pricing_engine(
    store: Arc<dyn Store>,
    config: Arc<ServerConfig>,
    settings: &EngineSettings,
) -> Result<Arc<PricingEngine>> {
    let catalog = Arc::new(Catalog::new(store.clone()));
    let accumulator = Arc::new(PressureAccumulator::new());
    let cache = Arc::new(PriceCache::new());
    let sessions = Arc::new(SessionRegistry::load(store.clone())?);
    let zone = Tz::from_str(&settings.timezone).unwrap_or(chrono_tz::UTC);
    Ok(Arc::new(PricingEngine::new(
        store, catalog, config, accumulator, cache, sessions, zone,
    )))
}

async fn serve(store: Arc<dyn Store>, config: Arc<ServerConfig>, settings: EngineSettings) -> Result<()> {
    let catalog = Arc::new(Catalog::new(store.clone()));
    let accumulator = Arc::new(PressureAccumulator::new());
    let cache = Arc::new(PriceCache::new());
    let sessions = Arc::new(SessionRegistry::load(store.clone())?);
    let zone = Tz::from_str(&settings.timezone).unwrap_or(chrono_tz::UTC);
    let pricing = Arc::new(PricingEngine::new(
        store.clone(),
        catalog.clone(),
        config.clone(),
        accumulator,
        cache,
        sessions.clone(),
        zone,
    ));
    let ledger = Arc::new(Ledger::new(store.clone(), config.clone()));
    let executor = Arc::new(TransactionExecutor::new(
        catalog.clone(),
        pricing.clone(),
        ledger.clone(),
        sessions.clone(),
        config.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = tokio::spawn(pricing.clone().run_scheduler(shutdown_rx));

    let state = AppState {
        catalog,
        pricing,
        ledger,
        executor,
        sessions,
    };
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "vendor engine listening");

    let serve_result = axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("ctrl-c received, shutting down");
        })
        .await;

    let _ = shutdown_tx.send(true);
    let _ = scheduler_handle.await;
    serve_result.map_err(anyhow::Error::from)
}
