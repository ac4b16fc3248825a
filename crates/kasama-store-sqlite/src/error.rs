//! Error type for `kasama-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value did not decode back into its domain type.
  #[error("corrupt row: {0}")]
  Decode(String),

  /// Submission referenced an account that does not exist.
  #[error("account not found: {0}")]
  AccountNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
