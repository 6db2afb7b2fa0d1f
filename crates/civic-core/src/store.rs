//! The `PetitionStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (`civic-store-sqlite`,
//! `civic-store-memory`). Higher layers (`civic-api`, `civic-server`) depend
//! on this abstraction, not on any concrete backend.
//!
//! Every mutating method is atomic: it either commits all of its writes
//! (petition row, ledger rows, timeline entries) or none of them.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Classify,
  lifecycle::SignResult,
  petition::{Category, NewPetition, Petition, PetitionStatus},
  response::{NewResponse, PetitionResponse},
  signature::{NewSignature, Signature},
  timeline::{TimelineEntry, TimelineEventKind},
};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 50;

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`PetitionStore::list_petitions`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PetitionQuery {
  pub category: Option<Category>,
  pub status:   Option<PetitionStatus>,
  /// Case-insensitive substring match on the title.
  pub search:   Option<String>,
  /// 1-based; defaults to 1.
  pub page:     Option<u32>,
  /// Clamped to `1..=MAX_PAGE_SIZE`; defaults to [`DEFAULT_PAGE_SIZE`].
  pub limit:    Option<u32>,
}

impl PetitionQuery {
  pub fn page(&self) -> u32 { self.page.unwrap_or(1).max(1) }

  pub fn limit(&self) -> u32 {
    self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page() - 1) * u64::from(self.limit())
  }

  /// The trimmed search term, if any remains after trimming.
  pub fn search_term(&self) -> Option<&str> {
    self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
  }

  /// The search term in the form backends compare against
  /// [`fold_case`]d titles.
  pub fn folded_search_term(&self) -> Option<String> {
    self.search_term().map(fold_case)
  }

  /// In-process equivalent of the backend filter.
  pub fn matches(&self, petition: &Petition) -> bool {
    self.category.is_none_or(|c| petition.category == c)
      && self.status.is_none_or(|s| petition.status == s)
      && self
        .folded_search_term()
        .is_none_or(|t| fold_case(&petition.title).contains(&t))
  }
}

/// Unicode lowercase used for case-insensitive title search.
pub fn fold_case(s: &str) -> String { s.to_lowercase() }

/// One page of results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  pub items:       Vec<T>,
  pub page:        u32,
  pub limit:       u32,
  pub total:       u64,
  pub total_pages: u64,
}

impl<T> Page<T> {
  pub fn new(items: Vec<T>, query: &PetitionQuery, total: u64) -> Self {
    let limit = query.limit();
    Self {
      items,
      page: query.page(),
      limit,
      total,
      total_pages: total.div_ceil(u64::from(limit)),
    }
  }
}

/// A petition together with everything it owns, read at one instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionDetail {
  #[serde(flatten)]
  pub petition:  Petition,
  /// Display order.
  pub timeline:  Vec<TimelineEntry>,
  /// Oldest first.
  pub responses: Vec<PetitionResponse>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a petition store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PetitionStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Petitions ─────────────────────────────────────────────────────────

  /// Validate and persist a new active petition, appending its `CREATED`
  /// timeline entry.
  fn create_petition(
    &self,
    input: NewPetition,
  ) -> impl Future<Output = Result<Petition, Self::Error>> + Send + '_;

  /// Retrieve a petition by id. Returns `None` if not found.
  fn get_petition(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Petition>, Self::Error>> + Send + '_;

  /// The petition with its timeline and responses. Returns `None` if not
  /// found.
  fn petition_detail(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PetitionDetail>, Self::Error>> + Send + '_;

  /// Filtered, paginated listing, newest first.
  fn list_petitions<'a>(
    &'a self,
    query: &'a PetitionQuery,
  ) -> impl Future<Output = Result<Page<Petition>, Self::Error>> + Send + 'a;

  /// Remove a petition and everything it owns.
  fn delete_petition(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Signing ───────────────────────────────────────────────────────────

  /// Record a signature and apply its effects on count, milestones and
  /// threshold as one unit.
  ///
  /// Fails with not-found, duplicate-signature, or invalid-state (checked in
  /// that order) without writing anything.
  fn sign(
    &self,
    input: NewSignature,
  ) -> impl Future<Output = Result<SignResult, Self::Error>> + Send + '_;

  /// All signatures on a petition, oldest first.
  fn list_signatures(
    &self,
    petition_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Signature>, Self::Error>> + Send + '_;

  // ── Timeline ──────────────────────────────────────────────────────────

  /// Append an entry. Validates only that the petition exists.
  fn append_timeline(
    &self,
    petition_id: Uuid,
    kind: TimelineEventKind,
    description: Option<String>,
  ) -> impl Future<Output = Result<TimelineEntry, Self::Error>> + Send + '_;

  /// The timeline in display order.
  fn timeline(
    &self,
    petition_id: Uuid,
  ) -> impl Future<Output = Result<Vec<TimelineEntry>, Self::Error>> + Send + '_;

  // ── Delivery gateway callbacks ────────────────────────────────────────

  /// `THRESHOLD_REACHED -> SENT`.
  fn mark_sent(
    &self,
    petition_id: Uuid,
  ) -> impl Future<Output = Result<Petition, Self::Error>> + Send + '_;

  /// `SENT -> DELIVERED`.
  fn mark_delivered(
    &self,
    petition_id: Uuid,
  ) -> impl Future<Output = Result<Petition, Self::Error>> + Send + '_;

  /// `DELIVERED -> READ`.
  fn mark_read(
    &self,
    petition_id: Uuid,
  ) -> impl Future<Output = Result<Petition, Self::Error>> + Send + '_;

  /// Petitions waiting for the delivery gateway, least recently updated
  /// first.
  fn ready_for_delivery(
    &self,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<Petition>, Self::Error>> + Send + '_;

  // ── Responses and closing ─────────────────────────────────────────────

  /// Store a response and move the petition to `RESPONDED`. Fails if the
  /// petition is closed.
  fn mark_responded(
    &self,
    petition_id: Uuid,
    response: NewResponse,
  ) -> impl Future<Output = Result<(Petition, PetitionResponse), Self::Error>>
  + Send
  + '_;

  /// Responses on a petition, oldest first.
  fn responses(
    &self,
    petition_id: Uuid,
  ) -> impl Future<Output = Result<Vec<PetitionResponse>, Self::Error>> + Send + '_;

  /// Administrative close from any non-terminal status.
  fn close(
    &self,
    petition_id: Uuid,
  ) -> impl Future<Output = Result<Petition, Self::Error>> + Send + '_;
}
