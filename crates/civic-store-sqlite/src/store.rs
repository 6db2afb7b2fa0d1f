//! [`SqliteStore`], the SQLite implementation of [`PetitionStore`].

use std::{path::Path, time::Duration};

use civic_core::{
  lifecycle::{SignResult, Step},
  petition::{NewPetition, Petition, PetitionStatus},
  response::{NewResponse, PetitionResponse},
  signature::{NewSignature, Signature},
  store::{Page, PetitionDetail, PetitionQuery, PetitionStore},
  timeline::{NewTimelineEntry, TimelineEntry, TimelineEventKind},
};
use rusqlite::{TransactionBehavior, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    PETITION_COLUMNS, RawPetition, encode_category, encode_status, encode_uuid,
    now,
  },
  ledger,
  schema::SCHEMA,
};

/// Upper bound on how long a transaction waits for a lock held by another
/// process sharing the database file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A petition store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` inside one transaction on the database thread, committing only
  /// if it succeeds.
  ///
  /// Writers use [`TransactionBehavior::Immediate`] so the write lock is held
  /// from the first read; a read-modify-write of a petition row can never
  /// interleave with another writer.
  async fn transact<T, F>(&self, behavior: TransactionBehavior, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(behavior)?;
        let out = f(&tx);
        if out.is_ok() {
          tx.commit()?;
        }
        Ok(out)
      })
      .await?
  }

  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self.transact(TransactionBehavior::Immediate, f).await
  }

  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self.transact(TransactionBehavior::Deferred, f).await
  }

  /// Apply a lifecycle step and append its timeline entry.
  async fn advance(&self, petition_id: Uuid, step: Step) -> Result<Petition> {
    let petition = self
      .write(move |tx| {
        let mut petition = ledger::require_petition(tx, petition_id)?;
        let at = now();
        let entry = petition.advance(step, at)?;
        ledger::write_state(tx, &petition)?;
        ledger::append_entry(tx, petition_id, entry, at)?;
        Ok(petition)
      })
      .await?;

    info!(%petition_id, %step, status = %petition.status, "petition advanced");
    Ok(petition)
  }

  /// Number of signature rows for a petition. Always equal to the petition's
  /// `signature_count`.
  pub async fn count_signatures(&self, petition_id: Uuid) -> Result<u64> {
    self
      .read(move |tx| ledger::count_signatures(tx, petition_id))
      .await
  }
}

fn like_pattern(term: &str) -> String {
  let escaped = term
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_");
  format!("%{escaped}%")
}

// ─── PetitionStore impl ──────────────────────────────────────────────────────

impl PetitionStore for SqliteStore {
  type Error = Error;

  // ── Petitions ─────────────────────────────────────────────────────────────

  async fn create_petition(&self, input: NewPetition) -> Result<Petition> {
    let petition = self
      .write(move |tx| {
        let at = now();
        let petition = Petition::create(input, at)?;
        ledger::insert_petition(tx, &petition)?;
        ledger::append_entry(
          tx,
          petition.petition_id,
          NewTimelineEntry::created(),
          at,
        )?;
        Ok(petition)
      })
      .await?;

    info!(
      petition_id = %petition.petition_id,
      goal = petition.signature_goal,
      "petition created"
    );
    Ok(petition)
  }

  async fn get_petition(&self, id: Uuid) -> Result<Option<Petition>> {
    self.read(move |tx| ledger::load_petition(tx, id)).await
  }

  async fn petition_detail(&self, id: Uuid) -> Result<Option<PetitionDetail>> {
    self
      .read(move |tx| {
        let Some(petition) = ledger::load_petition(tx, id)? else {
          return Ok(None);
        };
        Ok(Some(PetitionDetail {
          petition,
          timeline: ledger::load_timeline(tx, id)?,
          responses: ledger::load_responses(tx, id)?,
        }))
      })
      .await
  }

  async fn list_petitions(&self, query: &PetitionQuery) -> Result<Page<Petition>> {
    let category  = query.category.map(encode_category);
    let status    = query.status.map(encode_status);
    let pattern   = query.folded_search_term().as_deref().map(like_pattern);
    let limit_val = i64::from(query.limit());
    let offset_val = i64::try_from(query.offset())
      .map_err(|_| Error::Decode("page offset out of range".into()))?;

    let (raws, total): (Vec<RawPetition>, i64) = self
      .read(move |tx| {
        const FILTER: &str = "(?1 IS NULL OR category = ?1)
           AND (?2 IS NULL OR status = ?2)
           AND (?3 IS NULL OR title_folded LIKE ?3 ESCAPE '\\')";

        let total = tx.query_row(
          &format!("SELECT COUNT(*) FROM petitions WHERE {FILTER}"),
          params![category, status, pattern],
          |r| r.get(0),
        )?;

        let mut stmt = tx.prepare(&format!(
          "SELECT {PETITION_COLUMNS} FROM petitions
           WHERE {FILTER}
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            params![category, status, pattern, limit_val, offset_val],
            RawPetition::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawPetition::into_petition)
      .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(items, query, total.unsigned_abs()))
  }

  async fn delete_petition(&self, id: Uuid) -> Result<()> {
    self
      .write(move |tx| {
        let removed = tx.execute(
          "DELETE FROM petitions WHERE petition_id = ?1",
          params![encode_uuid(id)],
        )?;
        if removed == 0 {
          return Err(civic_core::Error::PetitionNotFound(id).into());
        }
        Ok(())
      })
      .await?;

    info!(petition_id = %id, "petition deleted");
    Ok(())
  }

  // ── Signing ───────────────────────────────────────────────────────────────

  async fn sign(&self, input: NewSignature) -> Result<SignResult> {
    let petition_id = input.petition_id;
    let citizen_id  = input.citizen_id;

    let outcome = self
      .write(move |tx| {
        let mut petition = ledger::require_petition(tx, petition_id)?;
        if ledger::has_signed(tx, petition_id, citizen_id)? {
          return Err(
            civic_core::Error::DuplicateSignature { petition_id, citizen_id }
              .into(),
          );
        }
        petition.ensure_accepts_signatures()?;

        let at = now();
        let signature = input.into_signature(at);
        ledger::insert_signature(tx, &signature)?;

        let effects = petition.register_signature(at)?;
        ledger::write_state(tx, &petition)?;
        for entry in effects.entries {
          ledger::append_entry(tx, petition_id, entry, at)?;
        }

        Ok(SignResult {
          signature,
          signature_count:   petition.signature_count,
          status:            petition.status,
          milestone:         effects.milestone,
          threshold_reached: effects.threshold_reached,
        })
      })
      .await;

    match &outcome {
      Ok(result) => {
        if let Some(m) = result.milestone {
          info!(%petition_id, milestone = m, "signature milestone reached");
        }
        if result.threshold_reached {
          info!(
            %petition_id,
            count = result.signature_count,
            "signature goal reached; petition ready for delivery"
          );
        }
      }
      Err(e) => debug!(%petition_id, %citizen_id, error = %e, "signature rejected"),
    }
    outcome
  }

  async fn list_signatures(&self, petition_id: Uuid) -> Result<Vec<Signature>> {
    self
      .read(move |tx| {
        ledger::require_petition(tx, petition_id)?;
        ledger::load_signatures(tx, petition_id)
      })
      .await
  }

  // ── Timeline ──────────────────────────────────────────────────────────────

  async fn append_timeline(
    &self,
    petition_id: Uuid,
    kind: TimelineEventKind,
    description: Option<String>,
  ) -> Result<TimelineEntry> {
    self
      .write(move |tx| {
        ledger::require_petition(tx, petition_id)?;
        ledger::append_entry(
          tx,
          petition_id,
          NewTimelineEntry { kind, description },
          now(),
        )
      })
      .await
  }

  async fn timeline(&self, petition_id: Uuid) -> Result<Vec<TimelineEntry>> {
    self
      .read(move |tx| {
        ledger::require_petition(tx, petition_id)?;
        ledger::load_timeline(tx, petition_id)
      })
      .await
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
    let status = encode_status(PetitionStatus::ThresholdReached);
    let limit_val = i64::from(limit);

    let raws: Vec<RawPetition> = self
      .read(move |tx| {
        let mut stmt = tx.prepare(&format!(
          "SELECT {PETITION_COLUMNS} FROM petitions
           WHERE status = ?1
           ORDER BY updated_at ASC, rowid ASC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(params![status, limit_val], RawPetition::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPetition::into_petition).collect()
  }

  // ── Responses and closing ─────────────────────────────────────────────────

  async fn mark_responded(
    &self,
    petition_id: Uuid,
    response: NewResponse,
  ) -> Result<(Petition, PetitionResponse)> {
    response.validate()?;

    let (petition, stored) = self
      .write(move |tx| {
        let mut petition = ledger::require_petition(tx, petition_id)?;
        let at = now();
        let stored = response.into_response(petition_id, at);
        let entry = petition.respond(&stored, at)?;

        ledger::insert_response(tx, &stored)?;
        ledger::write_state(tx, &petition)?;
        ledger::append_entry(tx, petition_id, entry, at)?;
        Ok((petition, stored))
      })
      .await?;

    info!(
      %petition_id,
      official = stored.official,
      "response recorded"
    );
    Ok((petition, stored))
  }

  async fn responses(&self, petition_id: Uuid) -> Result<Vec<PetitionResponse>> {
    self
      .read(move |tx| {
        ledger::require_petition(tx, petition_id)?;
        ledger::load_responses(tx, petition_id)
      })
      .await
  }

  async fn close(&self, petition_id: Uuid) -> Result<Petition> {
    self.advance(petition_id, Step::Close).await
  }
}
