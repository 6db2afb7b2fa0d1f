//! Petition, the aggregate whose mutable state the lifecycle engine owns.
//!
//! Everything a citizen fixes at creation (title, target, goal) is immutable.
//! Only `status`, `signature_count` and the lifecycle timestamps ever change,
//! and only through [`crate::lifecycle`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

/// Goal applied when the creator does not choose one.
pub const DEFAULT_SIGNATURE_GOAL: u64 = 1000;

/// Longest accepted title, in characters.
pub const MAX_TITLE_LEN: usize = 500;

/// Largest goal a store can persist as a signed 64-bit count.
pub const MAX_SIGNATURE_GOAL: u64 = i64::MAX as u64;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The fixed taxonomy of civic topics a petition can be filed under.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
  EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
  Infrastructure,
  Education,
  Healthcare,
  Security,
  Economy,
  Environment,
  Governance,
  HumanRights,
  Other,
}

/// Where a petition is in its lifecycle. See [`crate::lifecycle::Step`] for
/// the transition table.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
  EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PetitionStatus {
  /// Being authored; not reachable through creation in this engine.
  Draft,
  /// Open for signatures.
  Active,
  /// Goal met; waiting for the delivery gateway.
  ThresholdReached,
  Sent,
  Delivered,
  Read,
  Responded,
  /// Terminal.
  Closed,
}

impl PetitionStatus {
  /// Only active petitions take new signatures.
  pub fn accepts_signatures(self) -> bool { matches!(self, Self::Active) }

  pub fn is_terminal(self) -> bool { matches!(self, Self::Closed) }
}

// ─── Petition ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Petition {
  pub petition_id:       Uuid,
  pub title:             String,
  pub description:       String,
  pub category:          Category,
  pub creator_id:        Uuid,
  pub representative_id: Uuid,
  pub status:            PetitionStatus,
  pub signature_count:   u64,
  pub signature_goal:    u64,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
  pub sent_at:           Option<DateTime<Utc>>,
  pub delivered_at:      Option<DateTime<Utc>>,
  pub read_at:           Option<DateTime<Utc>>,
  pub responded_at:      Option<DateTime<Utc>>,
  pub closed_at:         Option<DateTime<Utc>>,
}

impl Petition {
  /// Build a freshly created, active petition with no signatures.
  pub fn create(input: NewPetition, at: DateTime<Utc>) -> Result<Self> {
    input.validate()?;
    Ok(Self {
      petition_id:       Uuid::new_v4(),
      title:             input.title.trim().to_owned(),
      description:       input.description,
      category:          input.category,
      creator_id:        input.creator_id,
      representative_id: input.representative_id,
      status:            PetitionStatus::Active,
      signature_count:   0,
      signature_goal:    input.signature_goal.unwrap_or(DEFAULT_SIGNATURE_GOAL),
      created_at:        at,
      updated_at:        at,
      sent_at:           None,
      delivered_at:      None,
      read_at:           None,
      responded_at:      None,
      closed_at:         None,
    })
  }

  /// Fail with [`Error::NotAcceptingSignatures`] unless the petition is
  /// active.
  pub fn ensure_accepts_signatures(&self) -> Result<()> {
    if self.status.accepts_signatures() {
      Ok(())
    } else {
      Err(Error::NotAcceptingSignatures {
        petition_id: self.petition_id,
        status:      self.status,
      })
    }
  }
}

// ─── NewPetition ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::PetitionStore::create_petition`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPetition {
  pub title:             String,
  pub description:       String,
  pub category:          Category,
  pub creator_id:        Uuid,
  pub representative_id: Uuid,
  /// Defaults to [`DEFAULT_SIGNATURE_GOAL`].
  pub signature_goal:    Option<u64>,
}

impl NewPetition {
  pub fn validate(&self) -> Result<()> {
    let title = self.title.trim();
    if title.is_empty() {
      return Err(Error::Validation("title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
      return Err(Error::Validation(format!(
        "title must be at most {MAX_TITLE_LEN} characters"
      )));
    }
    if self.description.trim().is_empty() {
      return Err(Error::Validation("description must not be empty".into()));
    }
    match self.signature_goal {
      Some(0) => {
        return Err(Error::Validation(
          "signature goal must be at least 1".into(),
        ));
      }
      Some(goal) if goal > MAX_SIGNATURE_GOAL => {
        return Err(Error::Validation(format!(
          "signature goal must be at most {MAX_SIGNATURE_GOAL}"
        )));
      }
      _ => {}
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input() -> NewPetition {
    NewPetition {
      title:             "Fix the Ring Road".into(),
      description:       "Potholes everywhere".into(),
      category:          Category::Infrastructure,
      creator_id:        Uuid::new_v4(),
      representative_id: Uuid::new_v4(),
      signature_goal:    None,
    }
  }

  #[test]
  fn create_defaults_goal_and_starts_active() {
    let p = Petition::create(input(), Utc::now()).unwrap();
    assert_eq!(p.status, PetitionStatus::Active);
    assert_eq!(p.signature_count, 0);
    assert_eq!(p.signature_goal, DEFAULT_SIGNATURE_GOAL);
    assert_eq!(p.created_at, p.updated_at);
  }

  #[test]
  fn oversized_goal_is_rejected() {
    let mut i = input();
    i.signature_goal = Some(u64::MAX);
    assert!(matches!(i.validate(), Err(Error::Validation(_))));
    assert!(Petition::create(i.clone(), Utc::now()).is_err());

    i.signature_goal = Some(MAX_SIGNATURE_GOAL);
    assert!(i.validate().is_ok());
  }

  #[test]
  fn zero_goal_is_rejected() {
    let mut i = input();
    i.signature_goal = Some(0);
    assert!(matches!(i.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn blank_title_is_rejected() {
    let mut i = input();
    i.title = "   ".into();
    assert!(matches!(i.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn overlong_title_is_rejected() {
    let mut i = input();
    i.title = "x".repeat(MAX_TITLE_LEN + 1);
    assert!(matches!(i.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn status_strings_match_wire_names() {
    assert_eq!(PetitionStatus::ThresholdReached.to_string(), "THRESHOLD_REACHED");
    assert_eq!(
      "HUMAN_RIGHTS".parse::<Category>().unwrap(),
      Category::HumanRights
    );
    assert_eq!(
      serde_json::to_value(PetitionStatus::Responded).unwrap(),
      serde_json::json!("RESPONDED")
    );
  }
}
