//! kasama-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the family-registry JSON API over
//! HTTP. The barangay portal mounts this behind its own session layer.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use kasama_api::ApiState;
use kasama_core::{
  error::NotifyError,
  notify::{Notifier, RegistrationEvent},
};
use kasama_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Kasama family-registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
struct ServerConfig {
  host:       String,
  port:       u16,
  store_path: PathBuf,
}

/// Notifier that writes every transition to the log. Stands in for the
/// health center's actual delivery channel (email blasts are sent by the
/// portal, not by this service).
struct LogNotifier;

impl Notifier for LogNotifier {
  fn notify(&self, event: &RegistrationEvent) -> Result<(), NotifyError> {
    tracing::info!(
      kind = ?event.kind,
      account_id = %event.account_id,
      member = %event.display_name,
      relationship = %event.relationship.describe(),
      "registration transition"
    );
    Ok(())
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

  // Load configuration; file and KASAMA_* environment variables layer
  // over the built-in defaults.
  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8710)?
    .set_default("store_path", "kasama.db")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("KASAMA"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = ApiState {
    store:    Arc::new(store),
    notifier: Arc::new(LogNotifier),
  };

  let app = kasama_api::api_router(state).layer(TraceLayer::new_for_http());
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
