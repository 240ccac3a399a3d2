use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fitgate_core::config::AppConfig;
use fitgate_infrastructure::{ConfigService, FitgatePaths};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "fitgate")]
#[command(about = "Fitgate - session synchronization and route gating for the fitness client", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Session store file (overrides `storage.session_file`)
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the persisted session, readiness and active route tree
    Status,
    /// Start the login flow, or finish it with the token returned by the provider
    Login {
        /// Token received on the redirect callback
        #[arg(long)]
        token: Option<String>,
    },
    /// Clear the session and log out of the identity provider
    Logout,
    /// Resolve a URL against the active route tree
    Open { url: String },
    /// Print the active route tree
    Routes {
        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(cli: &Cli) -> Result<ConfigService> {
    let paths = FitgatePaths::from_env();
    match &cli.config {
        Some(path) => Ok(ConfigService::with_file(paths, path)),
        None => ConfigService::new(paths).context("Failed to locate config directory"),
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_service = load_config(&cli)?;
    let config = config_service
        .load()
        .with_context(|| format!("Failed to load {}", config_service.config_file().display()))?;
    init_tracing(&config);

    let session_file = match &cli.storage {
        Some(path) => path.clone(),
        None => config_service
            .session_file(&config)
            .context("Failed to locate session store")?,
    };
    let mut app = commands::App::open(config, session_file)?;

    let outcome = match cli.command {
        Commands::Status => commands::status::run(&app),
        Commands::Login { token } => commands::session::login(&mut app, token.as_deref()).await,
        Commands::Logout => commands::session::logout(&mut app).await,
        Commands::Open { url } => commands::routes::open(&mut app, &url),
        Commands::Routes { json } => commands::routes::print(&app, json),
    };

    app.flush_notices();
    outcome
}
