//! Registration and family-member records.
//!
//! A [`Registration`] is a person candidate held in the review queue. Its
//! status moves `pending → approved | rejected`, both terminal; approval
//! promotes the person into a permanent [`FamilyMember`] row. Decided
//! registrations are kept as history and never block resubmission
//! (rejected) or feed anything but the historical duplicate tier
//! (approved).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::person::Person;

// ─── Account ─────────────────────────────────────────────────────────────────

/// A resident identity. Owns family members and registrations; never
/// mutated by this subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
  pub account_id:   Uuid,
  pub display_name: String,
  pub created_at:   DateTime<Utc>,
}

// ─── Registration ────────────────────────────────────────────────────────────

/// Lifecycle status of a registration. `Approved` and `Rejected` are
/// terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationStatus {
  Pending,
  Approved {
    at: DateTime<Utc>,
  },
  Rejected {
    reason: String,
    at:     DateTime<Utc>,
  },
}

impl RegistrationStatus {
  pub fn is_pending(&self) -> bool { matches!(self, Self::Pending) }
}

/// A submitted candidate, owned by exactly one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
  pub registration_id: Uuid,
  pub account_id:      Uuid,
  pub person:          Person,
  /// Reference to an uploaded photo or proof document; storage is a
  /// collaborator's concern.
  pub photo:           Option<String>,
  pub submitted_at:    DateTime<Utc>,
  pub status:          RegistrationStatus,
}

/// Input for [`RegistryStore::submit`](crate::store::RegistryStore::submit).
/// The person has already passed validation.
#[derive(Debug, Clone)]
pub struct NewRegistration {
  pub account_id: Uuid,
  pub person:     Person,
  pub photo:      Option<String>,
}

// ─── Family member ───────────────────────────────────────────────────────────

/// A permanently registered family member. Created only by promotion from
/// a pending registration, never directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
  pub member_id:       Uuid,
  pub account_id:      Uuid,
  pub person:          Person,
  /// The registration this member was promoted from.
  pub registration_id: Uuid,
  pub approved_at:     DateTime<Utc>,
}
