//! `lazysignup-server`: serves the lazy signup routes, or runs the
//! expired lazy user cleanup.
//!
//! Usage:
//!   lazysignup-server [-c <config.toml>] [serve|cleanup]
//!
//! The config path may also come from `LAZYSIGNUP_CONFIG`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use lazysignup_db::DbManager;
use lazysignup_server::{ServerConfig, build_router, build_service};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lazysignup-server", about = "Lazy signup server")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short = 'c', long = "config", env = "LAZYSIGNUP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve HTTP (default).
    Serve,
    /// Delete lazy users older than the configured expiry and exit.
    Cleanup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "lazysignup=info,info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?;

    let db = DbManager::connect_and_migrate(&config.database).await?;

    let service = Arc::new(build_service(db.client().clone(), config.lazysignup.clone())?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Cleanup => {
            let removed = service.remove_expired_users(chrono::Utc::now()).await?;
            info!(removed, "Cleanup finished");
        }
        Command::Serve => {
            let app = build_router(service, &config)?;
            let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
            info!(addr = %config.bind_addr, "Lazy signup server listening");
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
