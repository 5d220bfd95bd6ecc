use anyhow::{bail, Context, Result};
use apikit::{ApiConfig, Dispatcher};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliOverrides};
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod notes;
mod server;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Module name of the dispatcher settings in the `modules` config bag.
const API_MODULE: &str = "apikit";

/// apikit server - notes API built on typed apikit handlers
#[derive(Parser)]
#[command(name = "apikit-server")]
#[command(about = "apikit server - notes API built on typed apikit handlers")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration and handler registration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.config.as_deref() {
        if !path.is_file() {
            bail!("config file not found: {}", path.display());
        }
    }

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(CliOverrides {
        port: cli.port,
        verbose: cli.verbose,
    });

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("apikit server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

fn build_app(config: &AppConfig) -> Result<axum::Router> {
    let api: ApiConfig = config.module_config(API_MODULE)?;
    tracing::debug!(?api, "dispatcher settings");

    let dispatcher = Dispatcher::with_config(notes::error_codes(), api)
        .with_context(|| format!("Invalid configuration for module '{API_MODULE}'"))?;
    let notes = Arc::new(notes::NotesService::new());
    server::build_router(&dispatcher, notes, &config.server)
        .context("handler registration failed")
}

async fn run_server(config: AppConfig) -> Result<()> {
    let router = build_app(&config)?;
    server::serve(router, &config.server).await
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    build_app(&config)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
