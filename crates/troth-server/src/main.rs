//! troth server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the matching API over HTTP. The
//! daily batch sweep is triggered by an external scheduler calling
//! `POST /admin/run-matching`.

mod fanout;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use troth_api::ApiState;
use troth_engine::{BatchResolver, MatchService, NotificationEmitter, ResolverConfig};
use troth_store_sqlite::SqliteStore;

use crate::fanout::TracingFanout;

#[derive(Parser)]
#[command(author, version, about = "troth matching server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
  #[serde(default = "default_host")]
  host:               String,
  #[serde(default = "default_port")]
  port:               u16,
  #[serde(default = "default_store_path")]
  store_path:         PathBuf,
  /// Maximum records created per user per day by the batch sweep.
  #[serde(default = "default_daily_limit")]
  daily_limit:        u32,
  /// Minimum score for a proposal to survive the sweep.
  #[serde(default = "default_score_threshold")]
  score_threshold:    u8,
  /// Delay before retracting a removed match's fan-out entries.
  #[serde(default = "default_retract_grace_secs")]
  retract_grace_secs: u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 5480 }
fn default_store_path() -> PathBuf { PathBuf::from("troth.db") }
fn default_daily_limit() -> u32 { 5 }
fn default_score_threshold() -> u8 { 30 }
fn default_retract_grace_secs() -> u64 { 5 }

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TROTH"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .map_err(|e| anyhow::anyhow!("failed to open store at {store_path:?}: {e}"))?,
  );

  // Wire the engine.
  let emitter = NotificationEmitter::new(
    Arc::new(TracingFanout),
    Duration::from_secs(server_cfg.retract_grace_secs),
  );
  let service = Arc::new(MatchService::new(Arc::clone(&store), emitter));
  let resolver = Arc::new(BatchResolver::new(
    Arc::clone(&store),
    ResolverConfig {
      daily_limit:     server_cfg.daily_limit,
      score_threshold: server_cfg.score_threshold,
    },
  ));

  let app = troth_api::api_router(ApiState { service, resolver })
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
