//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so lexical order equals chronological order. Enums are stored by
//! their SCREAMING_SNAKE_CASE names. UUIDs are stored as hyphenated lowercase
//! strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use civic_core::{
  petition::{Category, Petition, PetitionStatus},
  response::PetitionResponse,
  signature::Signature,
  timeline::{TimelineEntry, TimelineEventKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the store persists.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_status(s: PetitionStatus) -> &'static str { s.into() }

pub fn encode_category(c: Category) -> &'static str { c.into() }

pub fn encode_event_kind(k: TimelineEventKind) -> &'static str { k.into() }

fn decode_enum<T: FromStr>(what: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

// ─── Counts ──────────────────────────────────────────────────────────────────

pub fn encode_count(n: u64) -> Result<i64> {
  i64::try_from(n).map_err(|_| Error::Decode(format!("count out of range: {n}")))
}

fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Decode(format!("negative count: {n}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawPetition::from_row`].
pub const PETITION_COLUMNS: &str = "petition_id, title, description, category,
  creator_id, representative_id, status, signature_count, signature_goal,
  created_at, updated_at, sent_at, delivered_at, read_at, responded_at,
  closed_at";

/// Raw values read directly from a `petitions` row.
pub struct RawPetition {
  pub petition_id:       String,
  pub title:             String,
  pub description:       String,
  pub category:          String,
  pub creator_id:        String,
  pub representative_id: String,
  pub status:            String,
  pub signature_count:   i64,
  pub signature_goal:    i64,
  pub created_at:        String,
  pub updated_at:        String,
  pub sent_at:           Option<String>,
  pub delivered_at:      Option<String>,
  pub read_at:           Option<String>,
  pub responded_at:      Option<String>,
  pub closed_at:         Option<String>,
}

impl RawPetition {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      petition_id:       row.get(0)?,
      title:             row.get(1)?,
      description:       row.get(2)?,
      category:          row.get(3)?,
      creator_id:        row.get(4)?,
      representative_id: row.get(5)?,
      status:            row.get(6)?,
      signature_count:   row.get(7)?,
      signature_goal:    row.get(8)?,
      created_at:        row.get(9)?,
      updated_at:        row.get(10)?,
      sent_at:           row.get(11)?,
      delivered_at:      row.get(12)?,
      read_at:           row.get(13)?,
      responded_at:      row.get(14)?,
      closed_at:         row.get(15)?,
    })
  }

  pub fn into_petition(self) -> Result<Petition> {
    Ok(Petition {
      petition_id:       decode_uuid(&self.petition_id)?,
      title:             self.title,
      description:       self.description,
      category:          decode_enum("category", &self.category)?,
      creator_id:        decode_uuid(&self.creator_id)?,
      representative_id: decode_uuid(&self.representative_id)?,
      status:            decode_enum("status", &self.status)?,
      signature_count:   decode_count(self.signature_count)?,
      signature_goal:    decode_count(self.signature_goal)?,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
      sent_at:           decode_opt_dt(self.sent_at)?,
      delivered_at:      decode_opt_dt(self.delivered_at)?,
      read_at:           decode_opt_dt(self.read_at)?,
      responded_at:      decode_opt_dt(self.responded_at)?,
      closed_at:         decode_opt_dt(self.closed_at)?,
    })
  }
}

/// Raw values read directly from a `signatures` row.
pub struct RawSignature {
  pub signature_id: String,
  pub petition_id:  String,
  pub citizen_id:   String,
  pub comment:      Option<String>,
  pub anonymous:    bool,
  pub created_at:   String,
}

impl RawSignature {
  pub fn into_signature(self) -> Result<Signature> {
    Ok(Signature {
      signature_id: decode_uuid(&self.signature_id)?,
      petition_id:  decode_uuid(&self.petition_id)?,
      citizen_id:   decode_uuid(&self.citizen_id)?,
      comment:      self.comment,
      anonymous:    self.anonymous,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `timeline` row.
pub struct RawTimelineEntry {
  pub sequence:    i64,
  pub entry_id:    String,
  pub petition_id: String,
  pub kind:        String,
  pub description: Option<String>,
  pub created_at:  String,
}

impl RawTimelineEntry {
  pub fn into_entry(self) -> Result<TimelineEntry> {
    Ok(TimelineEntry {
      entry_id:    decode_uuid(&self.entry_id)?,
      petition_id: decode_uuid(&self.petition_id)?,
      kind:        decode_enum("timeline event kind", &self.kind)?,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
      sequence:    decode_count(self.sequence)?,
    })
  }
}

/// Raw values read directly from a `responses` row.
pub struct RawResponse {
  pub response_id:     String,
  pub petition_id:     String,
  pub responder_name:  Option<String>,
  pub responder_title: Option<String>,
  pub content:         String,
  pub official:        bool,
  pub created_at:      String,
}

impl RawResponse {
  pub fn into_response(self) -> Result<PetitionResponse> {
    Ok(PetitionResponse {
      response_id:     decode_uuid(&self.response_id)?,
      petition_id:     decode_uuid(&self.petition_id)?,
      responder_name:  self.responder_name,
      responder_title: self.responder_title,
      content:         self.content,
      official:        self.official,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
