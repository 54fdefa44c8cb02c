//! agora-watch - Supermarket price watcher for sklavenitis.gr
//!
//! Scrapes product pages with TLS fingerprint emulation, keeps a SQLite
//! watchlist, and raises alerts when watched prices drop.

use agora_watch::commands::{CheckCommand, RunCommand, WatchlistCommand};
use agora_watch::config::{Config, OutputFormat};
use agora_watch::renderer::ExecutionEnvironment;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "agora-watch",
    version,
    about = "Supermarket price watcher for sklavenitis.gr",
    long_about = "Scrapes product pages with TLS fingerprint emulation, keeps a price watchlist in SQLite, and sends Telegram alerts when a watched price drops or meets its target."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SQLite database
    #[arg(long, global = true, env = "AGORA_DB")]
    db: Option<PathBuf>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "AGORA_PROXY")]
    proxy: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Scrape through a headless browser
    #[cfg(feature = "headless")]
    #[arg(long, global = true)]
    headless: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a product page once
    #[command(alias = "c")]
    Check {
        /// Product page URL
        url: String,
    },

    /// Run one check cycle over the whole watchlist
    #[command(alias = "r")]
    Run,

    /// Add a product page to the watchlist
    #[command(alias = "w")]
    Watch {
        /// Product page URL
        url: String,

        /// Display name for the product
        #[arg(short, long)]
        name: Option<String>,

        /// Alert when the price reaches this value
        #[arg(short, long)]
        target: Option<f64>,

        /// Add without enabling checks
        #[arg(long)]
        paused: bool,
    },

    /// List watchlist entries
    List,

    /// Remove a watchlist entry by id
    Remove {
        /// Watch item id
        id: i64,
    },

    /// Show recently captured prices
    History {
        /// Filter by product name
        #[arg(short, long)]
        product: Option<String>,

        /// Maximum number of rows
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.format = cli.format;

    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    #[cfg(feature = "headless")]
    let (env, browser) = if cli.headless {
        use agora_watch::renderer::ChromiumRenderer;
        use std::sync::Arc;

        let renderer = Arc::new(ChromiumRenderer::launch().await?);
        (ExecutionEnvironment::WithRenderer(renderer.clone()), Some(renderer))
    } else {
        (ExecutionEnvironment::HttpOnly, None)
    };

    #[cfg(not(feature = "headless"))]
    let env = ExecutionEnvironment::HttpOnly;

    let result = run_command(cli.command, config, &env).await;

    #[cfg(feature = "headless")]
    if let Some(renderer) = browser {
        use std::sync::Arc;
        use tracing::warn;

        drop(env);
        match Arc::try_unwrap(renderer) {
            Ok(renderer) => {
                if let Err(e) = renderer.shutdown().await {
                    warn!("Failed to shut down browser: {}", e);
                }
            }
            Err(_) => warn!("Browser still referenced at exit; skipping shutdown"),
        }
    }

    println!("{}", result?);
    Ok(())
}

async fn run_command(
    command: Commands,
    config: Config,
    env: &ExecutionEnvironment,
) -> Result<String> {
    match command {
        Commands::Check { url } => CheckCommand::new(config).execute(&url, env).await,

        Commands::Run => RunCommand::new(config).execute(env).await,

        Commands::Watch { url, name, target, paused } => {
            WatchlistCommand::new(config).add(&url, name.as_deref(), target, paused)
        }

        Commands::List => WatchlistCommand::new(config).list(),

        Commands::Remove { id } => WatchlistCommand::new(config).remove(id),

        Commands::History { product, limit } => {
            WatchlistCommand::new(config).history(product.as_deref(), limit)
        }
    }
}
