//! Handlers for the health-worker review endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/registrations/:id/approve` | 200 with the new member; 404 if not pending |
//! | `POST` | `/registrations/:id/reject`  | Body: `{"reason":"..."}`; 404 if not pending |
//!
//! Both transitions are terminal. The pending queue these act on is
//! `GET /registrations` without an `account_id`.

use axum::{
  Json,
  extract::{Path, State},
};
use kasama_core::{
  notify::EventKind,
  registration::{FamilyMember, Registration},
  store::RegistryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError, registrations::notify_transition};

/// `POST /registrations/:id/approve`
pub async fn approve<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<FamilyMember>, ApiError>
where
  S: RegistryStore,
{
  let member = state
    .store
    .approve(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no pending registration {id} to approve"))
    })?;

  notify_transition(
    state.notifier.as_ref(),
    EventKind::Approved,
    member.account_id,
    &member.person,
  );
  Ok(Json(member))
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
  pub reason: String,
}

/// `POST /registrations/:id/reject`
pub async fn reject<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RejectBody>,
) -> Result<Json<Registration>, ApiError>
where
  S: RegistryStore,
{
  let registration = state
    .store
    .reject(id, body.reason)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no pending registration {id} to reject"))
    })?;

  notify_transition(
    state.notifier.as_ref(),
    EventKind::Rejected,
    registration.account_id,
    &registration.person,
  );
  Ok(Json(registration))
}
