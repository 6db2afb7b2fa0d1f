//! [`MemoryStore`], a [`PetitionStore`] held entirely in memory.

use std::{
  collections::HashSet,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use chrono::{DateTime, Utc};
use civic_core::{
  Error, Result,
  lifecycle::{SignResult, Step},
  petition::{NewPetition, Petition, PetitionStatus},
  response::{NewResponse, PetitionResponse},
  signature::{NewSignature, Signature},
  store::{Page, PetitionDetail, PetitionQuery, PetitionStore},
  timeline::{NewTimelineEntry, TimelineEntry, TimelineEventKind, sort_for_display},
};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

/// A petition and everything it owns.
struct Record {
  petition:    Petition,
  /// Creation order; breaks ties between equal `created_at` values.
  created_seq: u64,
  signatures:  Vec<Signature>,
  signers:     HashSet<Uuid>,
  timeline:    Vec<TimelineEntry>,
  responses:   Vec<PetitionResponse>,
  /// Set under the lock by `delete_petition`; waiters that acquire the lock
  /// afterwards see the petition as gone.
  removed:     bool,
}

impl Record {
  fn append(
    &mut self,
    entry: NewTimelineEntry,
    at: DateTime<Utc>,
    sequence: u64,
  ) -> TimelineEntry {
    let entry = TimelineEntry {
      entry_id: Uuid::new_v4(),
      petition_id: self.petition.petition_id,
      kind: entry.kind,
      description: entry.description,
      created_at: at,
      sequence,
    };
    self.timeline.push(entry.clone());
    entry
  }
}

#[derive(Default)]
struct Inner {
  petitions: DashMap<Uuid, Arc<Mutex<Record>>>,
  sequence:  AtomicU64,
}

/// Thread-safe in-memory petition store.
///
/// Cloning is cheap; clones share the same underlying maps.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn next_sequence(&self) -> u64 {
    self.inner.sequence.fetch_add(1, Ordering::Relaxed) + 1
  }

  /// Lock one petition's record. The map guard is released before awaiting
  /// the mutex.
  async fn lock(&self, id: Uuid) -> Result<OwnedMutexGuard<Record>> {
    let record = self
      .inner
      .petitions
      .get(&id)
      .map(|entry| Arc::clone(entry.value()))
      .ok_or(Error::PetitionNotFound(id))?;

    let guard = record.lock_owned().await;
    if guard.removed {
      return Err(Error::PetitionNotFound(id));
    }
    Ok(guard)
  }

  /// Snapshot every live petition.
  async fn snapshot(&self) -> Vec<(Petition, u64)> {
    let records: Vec<_> = self
      .inner
      .petitions
      .iter()
      .map(|entry| Arc::clone(entry.value()))
      .collect();

    let mut out = Vec::with_capacity(records.len());
    for record in records {
      let guard = record.lock().await;
      if !guard.removed {
        out.push((guard.petition.clone(), guard.created_seq));
      }
    }
    out
  }

  async fn advance(&self, petition_id: Uuid, step: Step) -> Result<Petition> {
    let mut record = self.lock(petition_id).await?;
    let at = Utc::now();

    let mut petition = record.petition.clone();
    let entry = petition.advance(step, at)?;
    record.petition = petition.clone();
    let sequence = self.next_sequence();
    record.append(entry, at, sequence);

    info!(%petition_id, %step, status = %petition.status, "petition advanced");
    Ok(petition)
  }

  /// Number of signatures held for a petition; zero once it is deleted.
  pub async fn count_signatures(&self, petition_id: Uuid) -> u64 {
    match self.lock(petition_id).await {
      Ok(record) => record.signatures.len() as u64,
      Err(_) => 0,
    }
  }
}

// ─── PetitionStore impl ──────────────────────────────────────────────────────

impl PetitionStore for MemoryStore {
  type Error = Error;

  // ── Petitions ─────────────────────────────────────────────────────────────

  async fn create_petition(&self, input: NewPetition) -> Result<Petition> {
    let at = Utc::now();
    let petition = Petition::create(input, at)?;

    let mut record = Record {
      petition:    petition.clone(),
      created_seq: self.next_sequence(),
      signatures:  Vec::new(),
      signers:     HashSet::new(),
      timeline:    Vec::new(),
      responses:   Vec::new(),
      removed:     false,
    };
    let sequence = self.next_sequence();
    record.append(NewTimelineEntry::created(), at, sequence);

    self
      .inner
      .petitions
      .insert(petition.petition_id, Arc::new(Mutex::new(record)));

    info!(
      petition_id = %petition.petition_id,
      goal = petition.signature_goal,
      "petition created"
    );
    Ok(petition)
  }

  async fn get_petition(&self, id: Uuid) -> Result<Option<Petition>> {
    match self.lock(id).await {
      Ok(record) => Ok(Some(record.petition.clone())),
      Err(Error::PetitionNotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }

  async fn petition_detail(&self, id: Uuid) -> Result<Option<PetitionDetail>> {
    let record = match self.lock(id).await {
      Ok(record) => record,
      Err(Error::PetitionNotFound(_)) => return Ok(None),
      Err(e) => return Err(e),
    };

    let mut timeline = record.timeline.clone();
    sort_for_display(&mut timeline);
    Ok(Some(PetitionDetail {
      petition: record.petition.clone(),
      timeline,
      responses: record.responses.clone(),
    }))
  }

  async fn list_petitions(&self, query: &PetitionQuery) -> Result<Page<Petition>> {
    let mut matching: Vec<_> = self
      .snapshot()
      .await
      .into_iter()
      .filter(|(p, _)| query.matches(p))
      .collect();
    matching.sort_by(|(a, a_seq), (b, b_seq)| {
      (b.created_at, b_seq).cmp(&(a.created_at, a_seq))
    });

    let total = matching.len() as u64;
    let items = matching
      .into_iter()
      .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
      .take(query.limit() as usize)
      .map(|(p, _)| p)
      .collect();
    Ok(Page::new(items, query, total))
  }

  async fn delete_petition(&self, id: Uuid) -> Result<()> {
    let (_, record) = self
      .inner
      .petitions
      .remove(&id)
      .ok_or(Error::PetitionNotFound(id))?;

    let mut record = record.lock().await;
    record.removed = true;
    record.signatures.clear();
    record.signers.clear();
    record.timeline.clear();
    record.responses.clear();

    info!(petition_id = %id, "petition deleted");
    Ok(())
  }

  // ── Signing ───────────────────────────────────────────────────────────────

  async fn sign(&self, input: NewSignature) -> Result<SignResult> {
    let petition_id = input.petition_id;
    let citizen_id  = input.citizen_id;

    let mut record = self.lock(petition_id).await?;
    if record.signers.contains(&citizen_id) {
      debug!(%petition_id, %citizen_id, "duplicate signature rejected");
      return Err(Error::DuplicateSignature { petition_id, citizen_id });
    }
    if let Err(e) = record.petition.ensure_accepts_signatures() {
      debug!(%petition_id, %citizen_id, error = %e, "signature rejected");
      return Err(e);
    }

    let at = Utc::now();
    let mut petition = record.petition.clone();
    let effects = petition.register_signature(at)?;

    let signature = input.into_signature(at);
    record.signers.insert(citizen_id);
    record.signatures.push(signature.clone());
    record.petition = petition;
    for entry in effects.entries {
      let sequence = self.next_sequence();
      record.append(entry, at, sequence);
    }

    if let Some(m) = effects.milestone {
      info!(%petition_id, milestone = m, "signature milestone reached");
    }
    if effects.threshold_reached {
      info!(
        %petition_id,
        count = record.petition.signature_count,
        "signature goal reached; petition ready for delivery"
      );
    }

    Ok(SignResult {
      signature,
      signature_count: record.petition.signature_count,
      status: record.petition.status,
      milestone: effects.milestone,
      threshold_reached: effects.threshold_reached,
    })
  }

  async fn list_signatures(&self, petition_id: Uuid) -> Result<Vec<Signature>> {
    Ok(self.lock(petition_id).await?.signatures.clone())
  }

  // ── Timeline ──────────────────────────────────────────────────────────────

  async fn append_timeline(
    &self,
    petition_id: Uuid,
    kind: TimelineEventKind,
    description: Option<String>,
  ) -> Result<TimelineEntry> {
    let mut record = self.lock(petition_id).await?;
    let sequence = self.next_sequence();
    Ok(record.append(
      NewTimelineEntry { kind, description },
      Utc::now(),
      sequence,
    ))
  }

  async fn timeline(&self, petition_id: Uuid) -> Result<Vec<TimelineEntry>> {
    let mut timeline = self.lock(petition_id).await?.timeline.clone();
    sort_for_display(&mut timeline);
    Ok(timeline)
  }

  // ── Delivery gateway callbacks ────────────────────────────────────────────

  async fn mark_sent(&self, petition_id: Uuid) -> Result<Petition> {
    self.advance(petition_id, Step::Send).await
  }

  async fn mark_delivered(&self, petition_id: Uuid) -> Result<Petition> {
    self.advance(petition_id, Step::Deliver).await
  }

  async fn mark_read(&self, petition_id: Uuid) -> Result<Petition> {
    self.advance(petition_id, Step::Open).await
  }

  async fn ready_for_delivery(&self, limit: u32) -> Result<Vec<Petition>> {
    let mut ready: Vec<_> = self
      .snapshot()
      .await
      .into_iter()
      .filter(|(p, _)| p.status == PetitionStatus::ThresholdReached)
      .collect();
    ready.sort_by(|(a, a_seq), (b, b_seq)| {
      (a.updated_at, a_seq).cmp(&(b.updated_at, b_seq))
    });
    Ok(ready.into_iter().take(limit as usize).map(|(p, _)| p).collect())
  }

  // ── Responses and closing ─────────────────────────────────────────────────

  async fn mark_responded(
    &self,
    petition_id: Uuid,
    response: NewResponse,
  ) -> Result<(Petition, PetitionResponse)> {
    response.validate()?;
    let mut record = self.lock(petition_id).await?;

    let at = Utc::now();
    let stored = response.into_response(petition_id, at);
    let mut petition = record.petition.clone();
    let entry = petition.respond(&stored, at)?;

    record.petition = petition.clone();
    record.responses.push(stored.clone());
    let sequence = self.next_sequence();
    record.append(entry, at, sequence);

    info!(%petition_id, official = stored.official, "response recorded");
    Ok((petition, stored))
  }

  async fn responses(&self, petition_id: Uuid) -> Result<Vec<PetitionResponse>> {
    Ok(self.lock(petition_id).await?.responses.clone())
  }

  async fn close(&self, petition_id: Uuid) -> Result<Petition> {
    self.advance(petition_id, Step::Close).await
  }
}
