//! Pushkontak backend binary.
//!
//! Wires together the contact store, the WhatsApp bridge adapter, the
//! session manager, and the HTTP API, then serves until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use pushkontak::bot::archiver::ContactArchiver;
use pushkontak::bot::broadcast::{BroadcastJob, Pacing};
use pushkontak::bot::directory::DirectoryService;
use pushkontak::bot::session::SessionManager;
use pushkontak::config::Config;
use pushkontak::http::{self, AppState};
use pushkontak::store::{ContactStore, NullContactStore, SqliteContactStore};
use pushkontak::whatsapp::BridgeClientFactory;
use pushkontak::logging;

/// WhatsApp group broadcast backend.
#[derive(Debug, Parser)]
#[command(name = "pushkontak", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for rotating JSON log files. Console-only when omitted.
    #[arg(long)]
    logs_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let _logging_guard = match &cli.logs_dir {
        Some(dir) => Some(logging::init_production(dir)?),
        None => {
            logging::init_console();
            None
        }
    };

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    info!(port = config.server.port, bridge = %config.bridge.base_url, "pushkontak starting");

    let store = open_contact_store(&config.storage.database_url).await;

    let factory = Arc::new(BridgeClientFactory::new(config.bridge.base_url.clone()));
    let session = Arc::new(SessionManager::new(factory));
    let directory = Arc::new(DirectoryService::new(Arc::clone(&session)));
    let broadcast = Arc::new(BroadcastJob::new(
        Arc::clone(&session),
        Arc::clone(&directory),
        Pacing::default(),
    ));
    let archiver = Arc::new(ContactArchiver::new(Arc::clone(&directory), store));

    // Kick off the initial handshake. Failure is non-fatal; a later
    // GET /api/connect restarts it.
    if let Err(e) = session.connect().await {
        warn!(error = %e, "initial WhatsApp handshake failed");
    }

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    http::serve(
        listener,
        AppState {
            session,
            directory,
            broadcast,
            archiver,
        },
    )
    .await
    .context("HTTP server error")?;

    info!("pushkontak shut down cleanly");
    Ok(())
}

/// Open the SQLite contact store, falling back to the no-op store when the
/// database cannot be opened.
async fn open_contact_store(database_url: &str) -> Arc<dyn ContactStore> {
    match SqliteContactStore::connect(database_url).await {
        Ok(store) => {
            info!(url = database_url, "contact store ready");
            Arc::new(store)
        }
        Err(e) => {
            warn!(error = %e, "contact store unreachable, using in-memory mode");
            Arc::new(NullContactStore)
        }
    }
}
