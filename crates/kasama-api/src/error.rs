//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use kasama_core::{
  ValidationError,
  duplicate::{DuplicateMatch, DuplicateTier},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Malformed candidate input; surfaced verbatim, never retried.
  #[error("{0}")]
  Validation(#[from] ValidationError),

  /// A blocking duplicate tier. An expected business outcome, not a
  /// fault; no write was performed.
  #[error("submission blocked by an existing record")]
  Duplicate(DuplicateMatch),

  #[error("not found: {0}")]
  NotFound(String),

  /// Store failure on an authoritative path: fail closed, ask the caller
  /// to retry.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Tier-specific guidance shown to the submitter. The resolver itself
/// returns only the classification.
pub fn tier_message(tier: DuplicateTier) -> &'static str {
  match tier {
    DuplicateTier::ApprovedSame => {
      "this person is already registered as a member of your family"
    }
    DuplicateTier::PendingSame => {
      "you already have a pending request for this person"
    }
    DuplicateTier::ApprovedDifferent => {
      "this person is already registered under another resident's account"
    }
    DuplicateTier::PendingDifferent => {
      "another resident already has a pending request for this person"
    }
    DuplicateTier::ApprovedElsewhere => {
      "this person was recently approved under another resident's account"
    }
    DuplicateTier::ApprovedSameName | DuplicateTier::PendingSameName => {
      "a family member with this name already exists on your account with \
       a different date of birth"
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Validation(e) => (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": e.to_string() })),
      )
        .into_response(),

      ApiError::Duplicate(hit) => (
        StatusCode::CONFLICT,
        Json(json!({
          "error":                    tier_message(hit.tier),
          "tier":                     hit.tier,
          "conflicting_account":      hit.conflicting_account,
          "conflicting_relationship": hit.conflicting_relationship,
        })),
      )
        .into_response(),

      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }

      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure on authoritative path");
        (
          StatusCode::SERVICE_UNAVAILABLE,
          Json(json!({
            "error": "the registry is temporarily unavailable, please try again"
          })),
        )
          .into_response()
      }
    }
  }
}
