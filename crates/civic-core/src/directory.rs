//! The representative directory seam.
//!
//! Representative records live outside this engine. Creation handlers ask a
//! [`RepresentativeDirectory`] whether a target id is known before calling
//! [`crate::store::PetitionStore::create_petition`].

use std::collections::HashSet;

use uuid::Uuid;

pub trait RepresentativeDirectory: Send + Sync {
  fn exists(&self, representative_id: Uuid) -> bool;
}

/// Accepts every id. For deployments where the directory is enforced
/// upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenDirectory;

impl RepresentativeDirectory for OpenDirectory {
  fn exists(&self, _representative_id: Uuid) -> bool { true }
}

/// A fixed set of known representatives.
#[derive(Debug, Clone, Default)]
pub struct FixedDirectory {
  ids: HashSet<Uuid>,
}

impl FixedDirectory {
  pub fn new(ids: impl IntoIterator<Item = Uuid>) -> Self {
    Self { ids: ids.into_iter().collect() }
  }
}

impl RepresentativeDirectory for FixedDirectory {
  fn exists(&self, representative_id: Uuid) -> bool {
    self.ids.contains(&representative_id)
  }
}
