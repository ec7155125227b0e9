//! SD Connect server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `SDC_*`
//! environment variables, opens the configured store and serves the JSON API
//! under `/api`.

mod server_config;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use sdc_api::{AppState, api_router};
use sdc_core::kv::{KvStore, MemoryStore};
use sdc_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::server_config::{ServerConfig, StoreBackend};

#[derive(Parser)]
#[command(author, version, about = "SD Connect API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  match cfg.store_backend {
    StoreBackend::Memory => {
      tracing::warn!("using the in-memory store; data is lost on exit");
      serve(MemoryStore::new(), &cfg).await
    }
    StoreBackend::Sqlite => {
      let path = cfg.expanded_store_path();
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      tracing::info!(path = %path.display(), "opened sqlite store");
      serve(store, &cfg).await
    }
  }
}

async fn serve<S: KvStore + 'static>(kv: S, cfg: &ServerConfig) -> anyhow::Result<()> {
  let state = Arc::new(AppState::new(Arc::new(kv), cfg.settings()));
  let app = Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());

  let address = cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}
