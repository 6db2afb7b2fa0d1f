//! Error type for `civic-store-sqlite`.

use civic_core::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Core(#[from] civic_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value the domain types cannot represent.
  #[error("undecodable column: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) | Error::Sqlite(e) => {
        sqlite_kind(e)
      }
      Error::Database(_) => ErrorKind::StorageUnavailable,
      Error::Uuid(_) | Error::DateParse(_) | Error::Decode(_) => {
        ErrorKind::Internal
      }
    }
  }
}

/// Constraint violations and column decode failures are not transient; any
/// other engine failure (busy, locked, I/O) is.
fn sqlite_kind(e: &rusqlite::Error) -> ErrorKind {
  use rusqlite::Error as E;
  match e {
    E::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::ConstraintViolation => {
      ErrorKind::Internal
    }
    E::InvalidColumnType(..)
    | E::FromSqlConversionFailure(..)
    | E::IntegralValueOutOfRange(..)
    | E::Utf8Error(_)
    | E::InvalidColumnIndex(_)
    | E::InvalidColumnName(_)
    | E::QueryReturnedNoRows => ErrorKind::Internal,
    _ => ErrorKind::StorageUnavailable,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn busy_database_is_retryable() {
    let busy = Error::Sqlite(rusqlite::Error::SqliteFailure(
      rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
      None,
    ));
    assert_eq!(busy.kind(), ErrorKind::StorageUnavailable);
    assert!(busy.is_retryable());
  }

  #[test]
  fn constraint_violation_is_internal_however_wrapped() {
    let violation = || {
      rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_CHECK),
        None,
      )
    };
    let direct = Error::Sqlite(violation());
    let from_call = Error::Database(tokio_rusqlite::Error::Rusqlite(violation()));
    assert_eq!(direct.kind(), ErrorKind::Internal);
    assert_eq!(from_call.kind(), ErrorKind::Internal);
    assert!(!from_call.is_retryable());
  }

  #[test]
  fn column_decode_failures_are_internal() {
    let bad_column = rusqlite::Error::InvalidColumnType(
      7,
      "status".into(),
      rusqlite::types::Type::Integer,
    );
    assert_eq!(Error::Sqlite(bad_column).kind(), ErrorKind::Internal);

    let bad_value = rusqlite::Error::IntegralValueOutOfRange(7, -1);
    let wrapped = Error::Database(tokio_rusqlite::Error::Rusqlite(bad_value));
    assert_eq!(wrapped.kind(), ErrorKind::Internal);
  }

  #[test]
  fn busy_call_is_retryable() {
    let busy = Error::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
        None,
      ),
    ));
    assert_eq!(busy.kind(), ErrorKind::StorageUnavailable);
    assert!(busy.is_retryable());
  }

  #[test]
  fn decode_failures_are_internal() {
    let err = Error::Decode("unknown status".into());
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(!err.is_retryable());
  }
}
