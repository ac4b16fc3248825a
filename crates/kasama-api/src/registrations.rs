//! Handlers for the `/registrations` queue endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/registrations` | Body: [`SubmitBody`]; 201, 409 on conflict, 422 on bad input |
//! | `GET`    | `/registrations` | `?account_id=` for one resident; omit for the review queue |
//! | `DELETE` | `/registrations/:id` | `?account_id=` required; 404 unless owned and pending |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use kasama_core::{
  notify::{EventKind, Notifier, RegistrationEvent},
  person::{Candidate, Person},
  registration::{NewRegistration, Registration},
  store::{PendingScope, RegistryStore, SubmitOutcome},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// Fire a notification for a state transition. Best-effort: the state
/// change already committed, so a delivery failure is only logged.
pub(crate) fn notify_transition(
  notifier:   &dyn Notifier,
  kind:       EventKind,
  account_id: Uuid,
  person:     &Person,
) {
  let event = RegistrationEvent {
    kind,
    account_id,
    display_name: person.display_name(),
    relationship: person.relationship.clone(),
  };
  if let Err(e) = notifier.notify(&event) {
    tracing::warn!(error = %e, ?kind, "notification delivery failed");
  }
}

// ─── Submit ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /registrations`.
#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub account_id: Uuid,
  #[serde(flatten)]
  pub candidate:  Candidate,
  pub photo:      Option<String>,
}

/// `POST /registrations`
///
/// Validation runs before any duplicate check; a candidate with a future
/// birth date never reaches the resolver.
pub async fn submit<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let person = body.candidate.validate()?;

  state
    .store
    .get_account(body.account_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("account {} not found", body.account_id))
    })?;

  let outcome = state
    .store
    .submit(NewRegistration {
      account_id: body.account_id,
      person,
      photo: body.photo,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  match outcome {
    SubmitOutcome::Accepted(registration) => {
      notify_transition(
        state.notifier.as_ref(),
        EventKind::Submitted,
        registration.account_id,
        &registration.person,
      );
      Ok((StatusCode::CREATED, Json(registration)))
    }
    SubmitOutcome::Blocked(hit) => Err(ApiError::Duplicate(hit)),
  }
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// One resident's queue; omit for the health-worker view of everything.
  pub account_id: Option<Uuid>,
}

/// `GET /registrations[?account_id=<id>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Registration>>, ApiError>
where
  S: RegistryStore,
{
  let scope = match params.account_id {
    Some(id) => PendingScope::Account(id),
    None     => PendingScope::All,
  };

  let queue = state
    .store
    .list_pending(scope)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(queue))
}

// ─── Withdraw ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WithdrawParams {
  pub account_id: Uuid,
}

/// `DELETE /registrations/:id?account_id=<id>`
pub async fn withdraw<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<WithdrawParams>,
) -> Result<Json<Registration>, ApiError>
where
  S: RegistryStore,
{
  let withdrawn = state
    .store
    .withdraw(id, params.account_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no pending registration {id} to withdraw"))
    })?;
  Ok(Json(withdrawn))
}
