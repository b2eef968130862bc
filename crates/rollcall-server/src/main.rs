//! Rollcall server binary.
//!
//! Reads `rollcall.toml` (or the path specified with `--config`), builds
//! the in-memory attendance store, and serves the JSON API over HTTP.
//! Background tasks — the advisory-notification producer and, with
//! `--demo`, a scripted end-to-end scan — write through the same store
//! entry points as everything else.

mod demo;
mod notices;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use rollcall_api::AppState;
use rollcall_core::{session::TokenPolicy, store::AttendanceStore, student::Student};
use rollcall_verify::lifecycle::SessionLifecycle;

use serde::Deserialize;

#[derive(Parser)]
#[command(author, version, about = "Rollcall attendance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "rollcall.toml")]
  config: PathBuf,

  /// Run a scripted QR verification against a fresh session at startup.
  #[arg(long)]
  demo: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
  #[serde(default = "defaults::host")]
  host: String,
  #[serde(default = "defaults::port")]
  port: u16,
  /// Seconds per verification-code rotation window.
  #[serde(default = "defaults::token_rotation_secs")]
  token_rotation_secs: u32,
  /// Hard cap on a session token's lifetime, in seconds.
  #[serde(default = "defaults::token_max_secs")]
  token_max_secs: u32,
  /// Bound on how long a scan attempt may run without a terminal event.
  #[serde(default = "defaults::scan_timeout_secs")]
  scan_timeout_secs: u64,
  /// Seconds between advisory notifications; 0 disables the producer.
  #[serde(default = "defaults::notice_interval_secs")]
  notice_interval_secs: u64,
  /// Optional JSON roster loaded into the store at boot.
  #[serde(default)]
  roster_path: Option<PathBuf>,
}

mod defaults {
  pub fn host() -> String {
    "127.0.0.1".to_string()
  }
  pub fn port() -> u16 {
    7420
  }
  pub fn token_rotation_secs() -> u32 {
    30
  }
  pub fn token_max_secs() -> u32 {
    2 * 60 * 60
  }
  pub fn scan_timeout_secs() -> u64 {
    45
  }
  pub fn notice_interval_secs() -> u64 {
    30
  }
}

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
    .add_source(config::Environment::with_prefix("ROLLCALL"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Build the store and load the roster if one is configured.
  let store = AttendanceStore::new();
  if let Some(path) = &server_cfg.roster_path {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("failed to read roster at {path:?}"))?;
    let roster: Vec<Student> =
      serde_json::from_str(&raw).context("failed to parse roster JSON")?;
    tracing::info!(students = roster.len(), "roster loaded");
    store.load_roster(roster);
  }

  let lifecycle = Arc::new(SessionLifecycle::new(
    store.clone(),
    TokenPolicy {
      rotation_secs:     server_cfg.token_rotation_secs,
      max_lifetime_secs: server_cfg.token_max_secs,
    },
  ));

  // Background producers write through the same serialised entry points
  // as the API; none of them block verification handling.
  if server_cfg.notice_interval_secs > 0 {
    tokio::spawn(notices::run(
      store.clone(),
      std::time::Duration::from_secs(server_cfg.notice_interval_secs),
    ));
  }

  if cli.demo {
    tokio::spawn(demo::run(
      store.clone(),
      Arc::clone(&lifecycle),
      std::time::Duration::from_secs(server_cfg.scan_timeout_secs),
    ));
  }

  let state = AppState { store, lifecycle };
  let app = rollcall_api::api_router(state).layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
