//! The `RegistryStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g.
//! `kasama-store-sqlite`). The API layer depends on this abstraction, not
//! on any concrete backend.
//!
//! Expected business outcomes live in `Ok`: a blocked submission is
//! [`SubmitOutcome::Blocked`], an unknown or already-decided registration
//! is `None`. The associated `Error` type is reserved for store faults,
//! which authoritative paths treat as fail-closed.

use std::future::Future;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
  duplicate::DuplicateMatch,
  person::NameKey,
  registration::{Account, FamilyMember, NewRegistration, Registration},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Whose pending queue to read: one resident's, or everyone's (the
/// health-worker review view).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingScope {
  Account(Uuid),
  All,
}

/// Result of a submission attempt. A duplicate hit is an expected outcome,
/// not an error; no write happens on `Blocked`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
  Accepted(Registration),
  Blocked(DuplicateMatch),
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a family-registry backend.
///
/// `submit` must run its duplicate check and insert as one serialized unit
/// of work: of two concurrent submissions with the same normalized
/// identity, at most one may be accepted.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RegistryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Create a resident account. Bootstrap only; accounts are otherwise
  /// managed outside this subsystem.
  fn add_account(
    &self,
    display_name: String,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Retrieve an account by id. Returns `None` if not found.
  fn get_account(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  // ── Registration queue ────────────────────────────────────────────────

  /// Run the authoritative duplicate check and, if clear, insert a
  /// `pending` registration. Check and insert are one atomic unit.
  fn submit(
    &self,
    input: NewRegistration,
  ) -> impl Future<Output = Result<SubmitOutcome, Self::Error>> + Send + '_;

  /// Delete a registration, but only if it belongs to `account_id` and is
  /// still pending. Returns the removed record, or `None` otherwise —
  /// withdrawal is not a cancellation of a decision.
  fn withdraw(
    &self,
    registration_id: Uuid,
    account_id: Uuid,
  ) -> impl Future<Output = Result<Option<Registration>, Self::Error>> + Send + '_;

  /// Pending registrations in `scope`, newest first.
  fn list_pending(
    &self,
    scope: PendingScope,
  ) -> impl Future<Output = Result<Vec<Registration>, Self::Error>> + Send + '_;

  // ── Approval state machine ────────────────────────────────────────────

  /// Promote a pending registration into a permanent family member. Member
  /// insert and status flip are one transaction. Returns `None` if the id
  /// is unknown or already decided.
  fn approve(
    &self,
    registration_id: Uuid,
  ) -> impl Future<Output = Result<Option<FamilyMember>, Self::Error>> + Send + '_;

  /// Mark a pending registration rejected, recording the reason. The row
  /// is kept as history and never blocks a resubmission. Returns `None`
  /// if the id is unknown or already decided.
  fn reject(
    &self,
    registration_id: Uuid,
    reason: String,
  ) -> impl Future<Output = Result<Option<Registration>, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Approved family members of one account, newest first.
  fn list_members(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<Vec<FamilyMember>, Self::Error>> + Send + '_;

  /// Authoritative read-only classification of an identity, without any
  /// write. Same tier precedence as the check inside `submit`.
  fn check_duplicate(
    &self,
    account_id: Uuid,
    key: NameKey,
    date_of_birth: NaiveDate,
  ) -> impl Future<Output = Result<Option<DuplicateMatch>, Self::Error>> + Send + '_;

  /// Advisory name-only check for live-typing feedback, scoped to
  /// `account_id`. Callers treat a failure here as fail-open.
  fn check_name(
    &self,
    account_id: Uuid,
    key: NameKey,
  ) -> impl Future<Output = Result<Option<DuplicateMatch>, Self::Error>> + Send + '_;
}
