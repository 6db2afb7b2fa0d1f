//! Handlers for `/petitions/{id}/responses`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use civic_core::{
  petition::Petition,
  response::{NewResponse, PetitionResponse},
  store::PetitionStore,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `GET /petitions/{id}/responses`, oldest first.
pub async fn list<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Path(petition_id): Path<Uuid>,
) -> Result<Json<Vec<PetitionResponse>>, ApiError> {
  let responses = state
    .store
    .responses(petition_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(responses))
}

#[derive(Debug, Serialize)]
pub struct Responded {
  pub petition: Petition,
  pub response: PetitionResponse,
}

/// `POST /petitions/{id}/responses`, body: [`NewResponse`]; returns 201.
pub async fn create<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Path(petition_id): Path<Uuid>,
  Json(body): Json<NewResponse>,
) -> Result<impl IntoResponse, ApiError> {
  let (petition, response) = state
    .store
    .mark_responded(petition_id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(Responded { petition, response })))
}
