//! Error types for `civic-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{lifecycle::Step, petition::PetitionStatus};

#[derive(Debug, Error)]
pub enum Error {
  #[error("petition not found: {0}")]
  PetitionNotFound(Uuid),

  #[error("petition {petition_id} is {status} and cannot accept signatures")]
  NotAcceptingSignatures {
    petition_id: Uuid,
    status:      PetitionStatus,
  },

  #[error("petition {petition_id} is {status}; step {step} is not allowed")]
  IllegalStep {
    petition_id: Uuid,
    status:      PetitionStatus,
    step:        Step,
  },

  #[error("citizen {citizen_id} has already signed petition {petition_id}")]
  DuplicateSignature { petition_id: Uuid, citizen_id: Uuid },

  #[error("storage unavailable: {0}")]
  StorageUnavailable(String),

  #[error("invalid input: {0}")]
  Validation(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// The caller-facing category of a failure. Every backend error maps onto one
/// of these so that transports can respond uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  InvalidState,
  DuplicateSignature,
  /// Transient; the only kind a caller may retry.
  StorageUnavailable,
  Validation,
  /// Stored data could not be decoded.
  Internal,
}

impl ErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::NotFound => "not_found",
      Self::InvalidState => "invalid_state",
      Self::DuplicateSignature => "duplicate_signature",
      Self::StorageUnavailable => "storage_unavailable",
      Self::Validation => "validation",
      Self::Internal => "internal",
    }
  }
}

/// Implemented by every error type a [`crate::store::PetitionStore`] can
/// return.
pub trait Classify {
  fn kind(&self) -> ErrorKind;

  fn is_retryable(&self) -> bool {
    self.kind() == ErrorKind::StorageUnavailable
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::PetitionNotFound(_) => ErrorKind::NotFound,
      Self::NotAcceptingSignatures { .. } | Self::IllegalStep { .. } => {
        ErrorKind::InvalidState
      }
      Self::DuplicateSignature { .. } => ErrorKind::DuplicateSignature,
      Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
      Self::Validation(_) => ErrorKind::Validation,
    }
  }
}
