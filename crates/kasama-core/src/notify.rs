//! Notification trigger — the seam to the delivery collaborator.
//!
//! The core fires one event per state transition; delivery (email, SMS,
//! whatever the barangay uses) is entirely the implementation's concern.
//! Callers log a failed `notify` and move on. The state change is
//! authoritative; the notification is best-effort.

use serde::Serialize;
use uuid::Uuid;

use crate::{error::NotifyError, relationship::Relationship};

/// Which transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
  Submitted,
  Approved,
  Rejected,
}

/// One state transition, as handed to the notifier.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationEvent {
  pub kind:         EventKind,
  pub account_id:   Uuid,
  pub display_name: String,
  pub relationship: Relationship,
}

/// Outbound notification sink. Implementations must not block the caller
/// for long; anything slow should enqueue and return.
pub trait Notifier: Send + Sync {
  fn notify(&self, event: &RegistrationEvent) -> Result<(), NotifyError>;
}

/// A notifier that swallows events. Useful in tests.
pub struct NullNotifier;

impl Notifier for NullNotifier {
  fn notify(&self, _event: &RegistrationEvent) -> Result<(), NotifyError> {
    Ok(())
  }
}
