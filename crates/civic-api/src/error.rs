//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use civic_core::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Validation(String),

  #[error("{source}")]
  Store {
    kind:   ErrorKind,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Wrap a backend error, keeping its classification.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    Self::Store { kind: e.kind(), source: Box::new(e) }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::Validation(_) => ErrorKind::Validation,
      Self::Store { kind, .. } => *kind,
    }
  }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
    ErrorKind::DuplicateSignature | ErrorKind::InvalidState => {
      StatusCode::CONFLICT
    }
    ErrorKind::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    let status = status_for(kind);
    let message = self.to_string();
    if status.is_server_error() {
      tracing::error!(kind = kind.as_str(), error = %message, "request failed");
    }
    (status, Json(json!({ "error": message, "kind": kind.as_str() })))
      .into_response()
  }
}
