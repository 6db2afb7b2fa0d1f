//! Timeline entries: the append-only history of a petition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

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
pub enum TimelineEventKind {
  Created,
  SignatureMilestone,
  ThresholdReached,
  EmailSent,
  EmailDelivered,
  EmailOpened,
  ResponseReceived,
  Closed,
}

/// A single immutable timeline record.
///
/// Display order is `(created_at, sequence)` ascending. Entries produced by
/// the same operation share `created_at`; `sequence` preserves the order in
/// which they were inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
  pub entry_id:    Uuid,
  pub petition_id: Uuid,
  pub kind:        TimelineEventKind,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
  /// Store-assigned, strictly increasing insertion counter.
  pub sequence:    u64,
}

/// A timeline entry before the store has assigned its id and sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimelineEntry {
  pub kind:        TimelineEventKind,
  pub description: Option<String>,
}

impl NewTimelineEntry {
  pub fn new(kind: TimelineEventKind, description: impl Into<String>) -> Self {
    Self { kind, description: Some(description.into()) }
  }

  pub fn created() -> Self {
    Self::new(TimelineEventKind::Created, "Petition created")
  }
}

/// Sort entries into display order.
pub fn sort_for_display(entries: &mut [TimelineEntry]) {
  entries.sort_by_key(|e| (e.created_at, e.sequence));
}
