//! The live-typing duplicate check.
//!
//! `GET /duplicate-check?account_id=<id>&first=<..>&last=<..>[&middle=<..>]`
//!
//! Advisory by contract: name-only matching scoped to the caller's own
//! account, intended for form feedback while the resident is still
//! typing. It never blocks anything — the authoritative check runs inside
//! `POST /registrations` — and it fails open: a store error degrades to
//! `"unverified"` instead of surfacing a fault.

use axum::{
  Json,
  extract::{Query, State},
};
use kasama_core::{person::NameKey, store::RegistryStore};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{ApiState, error::tier_message};

#[derive(Debug, Deserialize)]
pub struct CheckParams {
  pub account_id: Uuid,
  pub first:      String,
  pub middle:     Option<String>,
  pub last:       String,
}

/// `GET /duplicate-check`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<CheckParams>,
) -> Json<Value>
where
  S: RegistryStore,
{
  let middle = params
    .middle
    .as_deref()
    .and_then(|s| s.trim().chars().next());
  let key = NameKey::new(&params.first, middle, &params.last);

  match state.store.check_name(params.account_id, key).await {
    Ok(Some(hit)) => Json(json!({
      "status":  "duplicate",
      "tier":    hit.tier,
      "message": tier_message(hit.tier),
    })),
    Ok(None) => Json(json!({ "status": "clear" })),
    Err(e) => {
      tracing::warn!(error = %e, "advisory duplicate check failed; failing open");
      Json(json!({
        "status":  "unverified",
        "message": "unable to verify right now, please try again",
      }))
    }
  }
}
