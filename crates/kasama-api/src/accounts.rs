//! Handlers for `/accounts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/accounts` | Body: `{"display_name":"..."}`; bootstrap only |
//! | `GET`  | `/accounts/:id/members` | Approved family members, newest first |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use kasama_core::{
  registration::{Account, FamilyMember},
  store::RegistryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub display_name: String,
}

/// `POST /accounts`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let account = state
    .store
    .add_account(body.display_name)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(account)))
}

/// `GET /accounts/:id/members`
pub async fn members<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<FamilyMember>>, ApiError>
where
  S: RegistryStore,
{
  let _account: Account = state
    .store
    .get_account(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("account {id} not found")))?;

  let members = state
    .store
    .list_members(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(members))
}
