//! Row-level helpers for the petition table and the three append-only
//! ledgers. Every function here runs inside a transaction opened by
//! [`crate::SqliteStore`]; none of them commits.

use chrono::{DateTime, Utc};
use civic_core::{
  petition::Petition,
  response::PetitionResponse,
  store::fold_case,
  signature::Signature,
  timeline::{NewTimelineEntry, TimelineEntry},
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    PETITION_COLUMNS, RawPetition, RawResponse, RawSignature, RawTimelineEntry,
    encode_category, encode_count, encode_dt, encode_event_kind, encode_status,
    encode_uuid,
  },
};

// ─── Petitions ───────────────────────────────────────────────────────────────

pub fn load_petition(conn: &Connection, id: Uuid) -> Result<Option<Petition>> {
  let raw = conn
    .query_row(
      &format!("SELECT {PETITION_COLUMNS} FROM petitions WHERE petition_id = ?1"),
      params![encode_uuid(id)],
      RawPetition::from_row,
    )
    .optional()?;
  raw.map(RawPetition::into_petition).transpose()
}

/// Like [`load_petition`] but absent petitions are an error.
pub fn require_petition(conn: &Connection, id: Uuid) -> Result<Petition> {
  load_petition(conn, id)?
    .ok_or(Error::Core(civic_core::Error::PetitionNotFound(id)))
}

pub fn insert_petition(conn: &Connection, p: &Petition) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO petitions ({PETITION_COLUMNS}, title_folded)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
               ?17)"
    ),
    params![
      encode_uuid(p.petition_id),
      p.title,
      p.description,
      encode_category(p.category),
      encode_uuid(p.creator_id),
      encode_uuid(p.representative_id),
      encode_status(p.status),
      encode_count(p.signature_count)?,
      encode_count(p.signature_goal)?,
      encode_dt(p.created_at),
      encode_dt(p.updated_at),
      p.sent_at.map(encode_dt),
      p.delivered_at.map(encode_dt),
      p.read_at.map(encode_dt),
      p.responded_at.map(encode_dt),
      p.closed_at.map(encode_dt),
      fold_case(&p.title),
    ],
  )?;
  Ok(())
}

/// Persist the mutable half of a petition: status, count and timestamps.
pub fn write_state(conn: &Connection, p: &Petition) -> Result<()> {
  conn.execute(
    "UPDATE petitions SET
       status          = ?2,
       signature_count = ?3,
       updated_at      = ?4,
       sent_at         = ?5,
       delivered_at    = ?6,
       read_at         = ?7,
       responded_at    = ?8,
       closed_at       = ?9
     WHERE petition_id = ?1",
    params![
      encode_uuid(p.petition_id),
      encode_status(p.status),
      encode_count(p.signature_count)?,
      encode_dt(p.updated_at),
      p.sent_at.map(encode_dt),
      p.delivered_at.map(encode_dt),
      p.read_at.map(encode_dt),
      p.responded_at.map(encode_dt),
      p.closed_at.map(encode_dt),
    ],
  )?;
  Ok(())
}

// ─── Signatures ──────────────────────────────────────────────────────────────

pub fn has_signed(
  conn: &Connection,
  petition_id: Uuid,
  citizen_id: Uuid,
) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM signatures WHERE petition_id = ?1 AND citizen_id = ?2",
        params![encode_uuid(petition_id), encode_uuid(citizen_id)],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

/// Insert a signature row. A unique-key violation on
/// `(petition_id, citizen_id)` is reported as a duplicate signature.
pub fn insert_signature(conn: &Connection, s: &Signature) -> Result<()> {
  let inserted = conn.execute(
    "INSERT INTO signatures
       (signature_id, petition_id, citizen_id, comment, anonymous, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      encode_uuid(s.signature_id),
      encode_uuid(s.petition_id),
      encode_uuid(s.citizen_id),
      s.comment,
      s.anonymous,
      encode_dt(s.created_at),
    ],
  );

  match inserted {
    Ok(_) => Ok(()),
    Err(rusqlite::Error::SqliteFailure(e, _))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
    {
      Err(Error::Core(civic_core::Error::DuplicateSignature {
        petition_id: s.petition_id,
        citizen_id:  s.citizen_id,
      }))
    }
    Err(e) => Err(e.into()),
  }
}

pub fn count_signatures(conn: &Connection, petition_id: Uuid) -> Result<u64> {
  let n: i64 = conn.query_row(
    "SELECT COUNT(*) FROM signatures WHERE petition_id = ?1",
    params![encode_uuid(petition_id)],
    |r| r.get(0),
  )?;
  Ok(n.unsigned_abs())
}

pub fn load_signatures(
  conn: &Connection,
  petition_id: Uuid,
) -> Result<Vec<Signature>> {
  let mut stmt = conn.prepare(
    "SELECT signature_id, petition_id, citizen_id, comment, anonymous, created_at
     FROM signatures
     WHERE petition_id = ?1
     ORDER BY created_at ASC, rowid ASC",
  )?;
  let raws = stmt
    .query_map(params![encode_uuid(petition_id)], |row| {
      Ok(RawSignature {
        signature_id: row.get(0)?,
        petition_id:  row.get(1)?,
        citizen_id:   row.get(2)?,
        comment:      row.get(3)?,
        anonymous:    row.get(4)?,
        created_at:   row.get(5)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws.into_iter().map(RawSignature::into_signature).collect()
}

// ─── Timeline ────────────────────────────────────────────────────────────────

pub fn append_entry(
  conn: &Connection,
  petition_id: Uuid,
  entry: NewTimelineEntry,
  at: DateTime<Utc>,
) -> Result<TimelineEntry> {
  let entry_id = Uuid::new_v4();
  conn.execute(
    "INSERT INTO timeline (entry_id, petition_id, kind, description, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    params![
      encode_uuid(entry_id),
      encode_uuid(petition_id),
      encode_event_kind(entry.kind),
      entry.description,
      encode_dt(at),
    ],
  )?;

  Ok(TimelineEntry {
    entry_id,
    petition_id,
    kind: entry.kind,
    description: entry.description,
    created_at: at,
    sequence: conn.last_insert_rowid().unsigned_abs(),
  })
}

pub fn load_timeline(
  conn: &Connection,
  petition_id: Uuid,
) -> Result<Vec<TimelineEntry>> {
  let mut stmt = conn.prepare(
    "SELECT sequence, entry_id, petition_id, kind, description, created_at
     FROM timeline
     WHERE petition_id = ?1
     ORDER BY created_at ASC, sequence ASC",
  )?;
  let raws = stmt
    .query_map(params![encode_uuid(petition_id)], |row| {
      Ok(RawTimelineEntry {
        sequence:    row.get(0)?,
        entry_id:    row.get(1)?,
        petition_id: row.get(2)?,
        kind:        row.get(3)?,
        description: row.get(4)?,
        created_at:  row.get(5)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws.into_iter().map(RawTimelineEntry::into_entry).collect()
}

// ─── Responses ───────────────────────────────────────────────────────────────

pub fn insert_response(conn: &Connection, r: &PetitionResponse) -> Result<()> {
  conn.execute(
    "INSERT INTO responses
       (response_id, petition_id, responder_name, responder_title, content,
        official, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      encode_uuid(r.response_id),
      encode_uuid(r.petition_id),
      r.responder_name,
      r.responder_title,
      r.content,
      r.official,
      encode_dt(r.created_at),
    ],
  )?;
  Ok(())
}

pub fn load_responses(
  conn: &Connection,
  petition_id: Uuid,
) -> Result<Vec<PetitionResponse>> {
  let mut stmt = conn.prepare(
    "SELECT response_id, petition_id, responder_name, responder_title, content,
            official, created_at
     FROM responses
     WHERE petition_id = ?1
     ORDER BY created_at ASC, rowid ASC",
  )?;
  let raws = stmt
    .query_map(params![encode_uuid(petition_id)], |row| {
      Ok(RawResponse {
        response_id:     row.get(0)?,
        petition_id:     row.get(1)?,
        responder_name:  row.get(2)?,
        responder_title: row.get(3)?,
        content:         row.get(4)?,
        official:        row.get(5)?,
        created_at:      row.get(6)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws.into_iter().map(RawResponse::into_response).collect()
}
