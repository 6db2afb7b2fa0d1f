//! civic-server binary.
//!
//! Reads `civic.toml` (or the path given with `--config`) and `CIVIC_*`
//! environment variables, opens the configured petition store, and serves the
//! JSON API over HTTP until interrupted.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use civic_core::{directory::RepresentativeDirectory, store::PetitionStore};
use civic_server::{Backend, ServerConfig};
use civic_store_memory::MemoryStore;
use civic_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Civic petition server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "civic.toml")]
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("CIVIC")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("representatives"),
    )
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  let directory = server_cfg.directory();

  match server_cfg.backend {
    Backend::Sqlite => {
      let store_path = expand_tilde(&server_cfg.store_path);
      if let Some(parent) = store_path.parent()
        && !parent.as_os_str().is_empty()
      {
        std::fs::create_dir_all(parent)
          .with_context(|| format!("failed to create {parent:?}"))?;
      }
      let store = SqliteStore::open(&store_path)
        .await
        .with_context(|| format!("failed to open store at {store_path:?}"))?;
      tracing::info!(path = ?store_path, "using sqlite store");
      serve(&server_cfg, store, directory).await
    }
    Backend::Memory => {
      tracing::warn!("using in-memory store; petitions are lost on exit");
      serve(&server_cfg, MemoryStore::new(), directory).await
    }
  }
}

async fn serve<S>(
  cfg: &ServerConfig,
  store: S,
  directory: Arc<dyn RepresentativeDirectory>,
) -> anyhow::Result<()>
where
  S: PetitionStore + 'static,
{
  let app = civic_server::router(Arc::new(store), directory);
  let address = cfg.address();

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("Listening on http://{address}");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server stopped");
  Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    () = ctrl_c => tracing::info!("received Ctrl-C, shutting down"),
    () = terminate => tracing::info!("received SIGTERM, shutting down"),
  }
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
