//! Signatures: one citizen's endorsement of one petition.
//!
//! A signature is written once and never updated. The pair
//! `(petition_id, citizen_id)` is unique across the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
  pub signature_id: Uuid,
  pub petition_id:  Uuid,
  pub citizen_id:   Uuid,
  pub comment:      Option<String>,
  pub anonymous:    bool,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`crate::store::PetitionStore::sign`].
#[derive(Debug, Clone)]
pub struct NewSignature {
  pub petition_id: Uuid,
  pub citizen_id:  Uuid,
  pub comment:     Option<String>,
  pub anonymous:   bool,
}

impl NewSignature {
  /// A public signature without a comment.
  pub fn new(petition_id: Uuid, citizen_id: Uuid) -> Self {
    Self { petition_id, citizen_id, comment: None, anonymous: false }
  }

  pub fn into_signature(self, at: DateTime<Utc>) -> Signature {
    Signature {
      signature_id: Uuid::new_v4(),
      petition_id:  self.petition_id,
      citizen_id:   self.citizen_id,
      comment:      self.comment.filter(|c| !c.trim().is_empty()),
      anonymous:    self.anonymous,
      created_at:   at,
    }
  }
}
