//! HTTP server assembly for civic petitions: configuration, backend
//! selection and the top-level router.

use std::{path::PathBuf, sync::Arc};

use axum::{Json, Router, routing::get};
use civic_core::{
  directory::{FixedDirectory, OpenDirectory, RepresentativeDirectory},
  store::PetitionStore,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Which [`PetitionStore`] implementation backs the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  #[default]
  Sqlite,
  Memory,
}

/// Runtime server configuration, deserialised from `civic.toml` and `CIVIC_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default)]
  pub backend:         Backend,
  /// Ignored by the memory backend. A leading `~` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// Known representatives. When absent every id is accepted.
  #[serde(default)]
  pub representatives: Option<Vec<Uuid>>,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/civic/civic.db") }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn directory(&self) -> Arc<dyn RepresentativeDirectory> {
    match &self.representatives {
      Some(ids) => Arc::new(FixedDirectory::new(ids.iter().copied())),
      None => Arc::new(OpenDirectory),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// `/health` plus the JSON API under `/api`, with request tracing.
pub fn router<S>(
  store: Arc<S>,
  directory: Arc<dyn RepresentativeDirectory>,
) -> Router
where
  S: PetitionStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", civic_api::api_router(store, directory))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> { Json(json!({ "status": "ok" })) }
