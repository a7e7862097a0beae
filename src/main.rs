//! News dashboard CLI - main entry point
//!
//! `serve` (default) runs the HTTP dashboard, `report` writes a one-off
//! Markdown snapshot of the same view.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

use news_dashboard::report::markdown;
use news_dashboard::{server, ChatFilter, Config, Dashboard};

#[derive(Parser)]
#[command(name = "news_dashboard")]
#[command(about = "Analytics dashboard for the Telegram AI News Bot", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: dashboard.yml, then ../dashboard.yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database written by the bot
    #[arg(long, global = true, env = "DASHBOARD_DB_PATH")]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard over HTTP
    Serve {
        /// Listen address (e.g., 127.0.0.1:8501)
        #[arg(long, env = "DASHBOARD_ADDR")]
        listen: Option<String>,

        /// Seconds a loaded dataset stays cached
        #[arg(long, env = "DASHBOARD_CACHE_TTL")]
        cache_ttl: Option<u64>,
    },

    /// Write a Markdown report of the dashboard
    Report {
        /// Chat id to filter by (default: All)
        #[arg(long)]
        chat_id: Option<String>,

        /// Path to save the Markdown report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Serve { .. } => "serve",
            Commands::Report { .. } => "report",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("news_dashboard=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load().context("Failed to load dashboard.yml")?,
    };
    if let Some(db_path) = cli.db_path {
        config.db_path = db_path;
    }

    let command = cli.command.unwrap_or(Commands::Serve {
        listen: None,
        cache_ttl: None,
    });
    info!(command = command.name(), db = %config.db_path.display(), "Starting");

    execute_command(command, config).await
}

async fn execute_command(command: Commands, mut config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Serve { listen, cache_ttl } => {
            if let Some(addr) = listen {
                config.listen_addr = addr;
            }
            if let Some(secs) = cache_ttl {
                config.cache_ttl = Duration::from_secs(secs);
            }

            let addr: SocketAddr = config
                .listen_addr
                .parse()
                .with_context(|| format!("Invalid listen address: {}", config.listen_addr))?;
            let dashboard = Arc::new(Dashboard::from_config(&config));

            tokio::select! {
                result = server::serve(addr, dashboard) => result?,
                _ = tokio::signal::ctrl_c() => info!("Shutting down"),
            }
        }
        Commands::Report { chat_id, output } => {
            let start = Instant::now();
            let selection = ChatFilter::parse(chat_id.as_deref());

            let path = markdown::write_report(&config, &selection, output)
                .await
                .context("Failed to write report")?;
            info!(
                filter = %selection,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Report written"
            );
            println!("Report saved to {}", path.display());
        }
    }

    Ok(())
}
