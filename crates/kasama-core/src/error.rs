//! Error types for `kasama-core`.

use thiserror::Error;

/// A candidate failed validation. Never retried; surfaced verbatim to the
/// submitter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("{field} must be at least 2 letters")]
  NameTooShort { field: &'static str },

  #[error("{field} must not contain digits")]
  NameHasDigit { field: &'static str },

  #[error("middle initial must be a single letter")]
  BadMiddleInitial,

  #[error("unrecognised suffix: {0:?}")]
  UnknownSuffix(String),

  #[error("unrecognised relationship: {0:?}")]
  UnknownRelationship(String),

  #[error("relationship description is required when relationship is 'other'")]
  MissingOtherRelationship,

  #[error("relationship description is limited to {max} characters")]
  OtherRelationshipTooLong { max: usize },

  #[error("date of birth is required")]
  MissingBirthDate,

  #[error("date of birth cannot be in the future")]
  BirthDateInFuture,

  #[error("implied age {0} is outside the accepted range of 0 to 120")]
  AgeOutOfRange(u32),
}

/// A notification could not be delivered. Always best-effort: callers log
/// this and never roll back the state change that triggered it.
#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("notification delivery failed: {0}")]
  Delivery(String),
}
