//! MedVault service entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use medvault::api::{create_router, AppState};
use medvault::config::Config;
use medvault::metrics;
use medvault::reaper;
use medvault::store::DetaStore;
use medvault::utils::shutdown_signal;

/// Encrypted medical-record storage service.
#[derive(Parser, Debug)]
#[command(name = "medvault")]
#[command(about = "Stores caller-encrypted medical records in Deta Base")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the record API server (default).
    Serve {
        /// HTTP server port; overrides PORT from the environment.
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one expired-token cleanup pass and exit.
    Reap,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("medvault=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    // Initialize metrics
    metrics::init_metrics();

    match args.command {
        Some(Command::Serve { port }) => cmd_serve(port).await,
        Some(Command::Reap) => cmd_reap().await,
        Some(Command::CheckConfig) => cmd_check_config().await,
        None => cmd_serve(None).await,
    }
}

/// Load and validate configuration, or bail.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        anyhow::bail!("Configuration validation failed: {}", e);
    }

    Ok(config)
}

/// Run the record API server.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = load_config()?;
    let port = port_override.unwrap_or(config.port);

    info!("Configuration loaded successfully");
    info!("Records collection: {}", config.records_collection);

    // Store client is built once; a bad project key is fatal here, not
    // per request.
    let store = Arc::new(DetaStore::new(&config)?);

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install metrics recorder: {e}"))?;

    let state =
        AppState::new(store, config.records_collection.clone()).with_metrics(prometheus);
    let router = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Run one expired-token cleanup pass.
async fn cmd_reap() -> anyhow::Result<()> {
    let config = load_config()?;
    let store = DetaStore::new(&config)?;

    let report = reaper::run(&store, &config.tokens_collection, config.token_ttl()).await?;
    info!(
        "Reap complete: {} matched, {} deleted, {} failed",
        report.matched, report.deleted, report.failed
    );

    reaper::send_heartbeat();
    Ok(())
}

/// Check configuration validity.
async fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("MEDVAULT - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Project ID: {}", config.project_id().unwrap_or("<unknown>"));
    println!("  Base URL: {}", config.deta_base_url);
    println!("  Records Collection: {}", config.records_collection);
    println!("  Tokens Collection: {}", config.tokens_collection);
    println!("  Token TTL: {}h", config.token_ttl_hours);
    println!("  Port: {}", config.port);
    println!("  Log Level: {}", config.rust_log);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}
