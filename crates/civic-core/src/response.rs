//! Responses from a representative's office.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionResponse {
  pub response_id:     Uuid,
  pub petition_id:     Uuid,
  pub responder_name:  Option<String>,
  pub responder_title: Option<String>,
  pub content:         String,
  pub official:        bool,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::PetitionStore::mark_responded`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResponse {
  pub responder_name:  Option<String>,
  pub responder_title: Option<String>,
  pub content:         String,
  #[serde(default)]
  pub official:        bool,
}

impl NewResponse {
  pub fn validate(&self) -> Result<()> {
    if self.content.trim().is_empty() {
      return Err(Error::Validation("response content must not be empty".into()));
    }
    Ok(())
  }

  pub fn into_response(
    self,
    petition_id: Uuid,
    at: DateTime<Utc>,
  ) -> PetitionResponse {
    PetitionResponse {
      response_id: Uuid::new_v4(),
      petition_id,
      responder_name: self.responder_name,
      responder_title: self.responder_title,
      content: self.content,
      official: self.official,
      created_at: at,
    }
  }
}
