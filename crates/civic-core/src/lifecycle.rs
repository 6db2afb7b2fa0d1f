//! The petition state machine and the signature-driven rules.
//!
//! Backends never touch `status`, `signature_count` or the lifecycle
//! timestamps directly. They load a [`Petition`], call one of the methods
//! here, persist the mutated petition together with the returned timeline
//! entries, and commit all of it as one unit.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{Display, EnumIter};

use crate::{
  Error, Result,
  petition::{Petition, PetitionStatus},
  response::PetitionResponse,
  signature::Signature,
  timeline::{NewTimelineEntry, TimelineEventKind},
};

/// Signature counts that earn a celebratory timeline entry. Matched by exact
/// equality with the post-increment count.
pub const MILESTONES: [u64; 5] = [100, 500, 1000, 5000, 10000];

// ─── Steps ───────────────────────────────────────────────────────────────────

/// A lifecycle event that moves a petition between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Step {
  /// Signing only; requires `signature_count >= signature_goal`.
  ReachThreshold,
  /// Delivery gateway handed the petition to its transport.
  Send,
  /// Transport confirmed delivery.
  Deliver,
  /// The representative's office opened it.
  Open,
  Respond,
  /// Administrative override.
  Close,
}

impl Step {
  pub fn event_kind(self) -> TimelineEventKind {
    match self {
      Self::ReachThreshold => TimelineEventKind::ThresholdReached,
      Self::Send => TimelineEventKind::EmailSent,
      Self::Deliver => TimelineEventKind::EmailDelivered,
      Self::Open => TimelineEventKind::EmailOpened,
      Self::Respond => TimelineEventKind::ResponseReceived,
      Self::Close => TimelineEventKind::Closed,
    }
  }
}

impl PetitionStatus {
  /// The transition table. `None` means the step is illegal from `self`.
  pub fn after(self, step: Step) -> Option<PetitionStatus> {
    use PetitionStatus::*;

    match (self, step) {
      (Closed, _) => None,
      (_, Step::Close) => Some(Closed),
      (_, Step::Respond) => Some(Responded),
      (Active, Step::ReachThreshold) => Some(ThresholdReached),
      (ThresholdReached, Step::Send) => Some(Sent),
      (Sent, Step::Deliver) => Some(Delivered),
      (Delivered, Step::Open) => Some(Read),
      (
        Draft | Active | ThresholdReached | Sent | Delivered | Read | Responded,
        Step::ReachThreshold | Step::Send | Step::Deliver | Step::Open,
      ) => None,
    }
  }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

impl Petition {
  /// Apply `step`, stamping its lifecycle timestamp the first time it is
  /// reached. Returns the timeline entry the caller must append.
  ///
  /// On error the petition is left untouched.
  pub fn advance(
    &mut self,
    step: Step,
    at: DateTime<Utc>,
  ) -> Result<NewTimelineEntry> {
    let illegal = || Error::IllegalStep {
      petition_id: self.petition_id,
      status: self.status,
      step,
    };

    if step == Step::ReachThreshold && self.signature_count < self.signature_goal
    {
      return Err(illegal());
    }
    let next = self.status.after(step).ok_or_else(illegal)?;

    let stamp = match step {
      Step::ReachThreshold => None,
      Step::Send => Some(&mut self.sent_at),
      Step::Deliver => Some(&mut self.delivered_at),
      Step::Open => Some(&mut self.read_at),
      Step::Respond => Some(&mut self.responded_at),
      Step::Close => Some(&mut self.closed_at),
    };
    if let Some(slot) = stamp {
      slot.get_or_insert(at);
    }

    self.status = next;
    self.updated_at = at;
    Ok(NewTimelineEntry::new(step.event_kind(), self.describe(step)))
  }

  /// Record that `response` arrived. The timeline entry names the responder
  /// when one is given.
  pub fn respond(
    &mut self,
    response: &PetitionResponse,
    at: DateTime<Utc>,
  ) -> Result<NewTimelineEntry> {
    let mut entry = self.advance(Step::Respond, at)?;
    if let Some(name) = &response.responder_name {
      entry.description = Some(format!("Response received from {name}"));
    }
    Ok(entry)
  }

  /// Count one new signature and evaluate milestones and the goal.
  ///
  /// The caller has already established that the signature is not a
  /// duplicate. Milestone entries precede the threshold entry.
  pub fn register_signature(
    &mut self,
    at: DateTime<Utc>,
  ) -> Result<SignatureEffects> {
    self.ensure_accepts_signatures()?;

    self.signature_count += 1;
    self.updated_at = at;

    let mut entries = Vec::new();
    let milestone = MILESTONES
      .iter()
      .copied()
      .find(|m| *m == self.signature_count);
    if let Some(m) = milestone {
      entries.push(NewTimelineEntry::new(
        TimelineEventKind::SignatureMilestone,
        format!("Petition reached {m} signatures!"),
      ));
    }

    let threshold_reached = self.signature_count >= self.signature_goal
      && self.status == PetitionStatus::Active;
    if threshold_reached {
      entries.push(self.advance(Step::ReachThreshold, at)?);
    }

    Ok(SignatureEffects { milestone, threshold_reached, entries })
  }

  fn describe(&self, step: Step) -> String {
    match step {
      Step::ReachThreshold => format!(
        "Petition reached {} signatures! Ready to be sent.",
        self.signature_goal
      ),
      Step::Send => "Petition sent to representative".into(),
      Step::Deliver => "Petition delivered to representative".into(),
      Step::Open => "Petition opened by representative".into(),
      Step::Respond => "Response received".into(),
      Step::Close => "Petition closed".into(),
    }
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// What one accepted signature did to its petition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureEffects {
  pub milestone:         Option<u64>,
  pub threshold_reached: bool,
  /// Timeline entries to append, in order.
  pub entries:           Vec<NewTimelineEntry>,
}

/// Returned by [`crate::store::PetitionStore::sign`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResult {
  pub signature:         Signature,
  pub signature_count:   u64,
  pub status:            PetitionStatus,
  pub milestone:         Option<u64>,
  pub threshold_reached: bool,
}
