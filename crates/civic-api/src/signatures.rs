//! Handlers for signing and listing signatures.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use civic_core::{
  signature::{NewSignature, Signature},
  store::PetitionStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// JSON body accepted by `POST /petitions/{id}/sign`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignBody {
  pub citizen_id: Uuid,
  pub comment:    Option<String>,
  #[serde(default)]
  pub anonymous:  bool,
}

/// `POST /petitions/{id}/sign`: returns 201 + the sign result.
pub async fn sign<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Path(petition_id): Path<Uuid>,
  Json(body): Json<SignBody>,
) -> Result<impl IntoResponse, ApiError> {
  let result = state
    .store
    .sign(NewSignature {
      petition_id,
      citizen_id: body.citizen_id,
      comment: body.comment,
      anonymous: body.anonymous,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(result)))
}

/// A signature as shown publicly; anonymous signers are not identified.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureView {
  pub signature_id: Uuid,
  pub citizen_id:   Option<Uuid>,
  pub comment:      Option<String>,
  pub anonymous:    bool,
  pub created_at:   DateTime<Utc>,
}

impl From<Signature> for SignatureView {
  fn from(s: Signature) -> Self {
    Self {
      signature_id: s.signature_id,
      citizen_id:   (!s.anonymous).then_some(s.citizen_id),
      comment:      s.comment,
      anonymous:    s.anonymous,
      created_at:   s.created_at,
    }
  }
}

/// `GET /petitions/{id}/signatures`
pub async fn list<S: PetitionStore>(
  State(state): State<AppState<S>>,
  Path(petition_id): Path<Uuid>,
) -> Result<Json<Vec<SignatureView>>, ApiError> {
  let signatures = state
    .store
    .list_signatures(petition_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(signatures.into_iter().map(SignatureView::from).collect()))
}
