//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use tether_core::config::{Config, paths};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "tether")]
#[command(version = "0.2")]
#[command(about = "Sign-in flows for the tether assistant")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in to an instance
    Login {
        /// Instance URL to pre-select (defaults to the configured endpoint)
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
    },
    /// Show the authentication status for an endpoint
    Status {
        /// Instance URL to check (defaults to the most recent endpoint)
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
    },
    /// Remove the stored token for an endpoint
    Logout {
        /// Instance URL to sign out from (defaults to the most recent endpoint)
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let _guard = init_tracing()?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load().context("load config")?;

    match cli.command {
        Commands::Login { endpoint } => commands::auth::login(&config, endpoint.as_deref()).await,
        Commands::Status { endpoint } => commands::auth::status(&config, endpoint.as_deref()).await,
        Commands::Logout { endpoint } => commands::auth::logout(&config, endpoint.as_deref()).await,
    }
}

/// Installs the tracing subscriber: a RUST_LOG-filtered daily log file under
/// the tether home. The guard must stay alive for the process lifetime.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let logs_dir = paths::logs_dir();
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("create log directory {}", logs_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "tether.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    Ok(guard)
}
