//! Handlers for `/petitions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/petitions` | Optional `category`, `status`, `search`, `page`, `limit` |
//! | `POST`   | `/petitions` | Body: [`NewPetition`]; returns 201 + stored petition |
//! | `GET`    | `/petitions/{id}` | Petition with timeline and responses |
//! | `DELETE` | `/petitions/{id}` | 204; removes everything the petition owns |
//! | `POST`   | `/petitions/{id}/close` | Administrative close |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use civic_core::{
  petition::{NewPetition, Petition},
  store::{Page, PetitionDetail, PetitionQuery, PetitionStore},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /petitions[?category=..][&status=..][&search=..][&page=..][&limit=..]`
pub async fn list<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Query(query): Query<PetitionQuery>,
) -> Result<Json<Page<Petition>>, ApiError> {
  let page = state
    .store
    .list_petitions(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /petitions`. The representative must be known to the directory.
pub async fn create<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewPetition>,
) -> Result<impl IntoResponse, ApiError> {
  if !state.directory.exists(body.representative_id) {
    return Err(ApiError::Validation(format!(
      "unknown representative: {}",
      body.representative_id
    )));
  }

  let petition = state
    .store
    .create_petition(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(petition)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /petitions/{id}`
pub async fn get_one<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<PetitionDetail>, ApiError> {
  let detail = state
    .store
    .petition_detail(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("petition not found: {id}")))?;
  Ok(Json(detail))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /petitions/{id}`
pub async fn delete_one<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.store.delete_petition(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Close ────────────────────────────────────────────────────────────────────

/// `POST /petitions/{id}/close`
pub async fn close<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Petition>, ApiError> {
  let petition = state.store.close(id).await.map_err(ApiError::store)?;
  Ok(Json(petition))
}
