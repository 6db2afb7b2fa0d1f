//! Delivery gateway callbacks and the ready queue.
//!
//! | Method | Path | Transition |
//! |--------|------|------------|
//! | `POST` | `/petitions/{id}/sent` | `THRESHOLD_REACHED -> SENT` |
//! | `POST` | `/petitions/{id}/delivered` | `SENT -> DELIVERED` |
//! | `POST` | `/petitions/{id}/read` | `DELIVERED -> READ` |
//! | `GET`  | `/delivery/ready` | Optional `?limit`; least recently updated first |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use civic_core::{
  petition::Petition,
  store::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PetitionStore},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub async fn sent<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Petition>, ApiError> {
  Ok(Json(state.store.mark_sent(id).await.map_err(ApiError::store)?))
}

pub async fn delivered<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Petition>, ApiError> {
  Ok(Json(state.store.mark_delivered(id).await.map_err(ApiError::store)?))
}

pub async fn read<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Petition>, ApiError> {
  Ok(Json(state.store.mark_read(id).await.map_err(ApiError::store)?))
}

#[derive(Debug, Deserialize)]
pub struct ReadyParams {
  pub limit: Option<u32>,
}

/// `GET /delivery/ready[?limit=<n>]`
pub async fn ready<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ReadyParams>,
) -> Result<Json<Vec<Petition>>, ApiError> {
  let limit = params
    .limit
    .unwrap_or(DEFAULT_PAGE_SIZE)
    .clamp(1, MAX_PAGE_SIZE);
  let ready = state
    .store
    .ready_for_delivery(limit)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ready))
}
