//! Task board server
//!
//! Serves the typed RPC procedures and, unless disabled, the htmx board UI
//! on the same listener.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use taskboard::config::{Config, UiMode};
use taskboard::db::Database;
use taskboard::rpc::AppState;
use taskboard::{rpc, web};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// UI mode for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliUiMode {
    /// RPC procedures only
    None,
    /// RPC procedures plus the board UI
    Web,
}

/// Task board server and CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// UI mode: none (RPC only) or web (serve the board)
    #[arg(long, value_enum, global = true)]
    pub ui: Option<CliUiMode>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the server (default if no subcommand given)
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let mut config = Config::load(cli.config.as_deref())?;

    // CLI flags override the config file
    if let Some(database) = cli.database {
        config.server.db_path = database;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ui) = cli.ui {
        config.server.ui = match ui {
            CliUiMode::None => UiMode::None,
            CliUiMode::Web => UiMode::Web,
        };
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)?;
    info!(db_path = %config.server.db_path.display(), "database ready");

    let state = AppState::new(db);

    // Permissive CORS: the identity header comes from the fronting proxy,
    // and browser clients for the RPC surface live on other origins in dev.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = rpc::router();
    if config.server.ui == UiMode::Web {
        router = router.merge(web::router());
    }
    let app = router
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, ui = ?config.server.ui, "task board listening");

    axum::serve(listener, app).await?;
    Ok(())
}
