//! Handlers for `/petitions/{id}/timeline`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use civic_core::{
  store::PetitionStore,
  timeline::{TimelineEntry, TimelineEventKind},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `GET /petitions/{id}/timeline`, in display order.
pub async fn list<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Path(petition_id): Path<Uuid>,
) -> Result<Json<Vec<TimelineEntry>>, ApiError> {
  let entries = state
    .store
    .timeline(petition_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct AppendBody {
  pub kind:        TimelineEventKind,
  pub description: Option<String>,
}

/// `POST /petitions/{id}/timeline`, body: `{"kind":"EMAIL_SENT","description":"..."}`
pub async fn append<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Path(petition_id): Path<Uuid>,
  Json(body): Json<AppendBody>,
) -> Result<impl IntoResponse, ApiError> {
  let entry = state
    .store
    .append_timeline(petition_id, body.kind, body.description)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(entry)))
}
