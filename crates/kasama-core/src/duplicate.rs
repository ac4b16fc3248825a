//! Duplicate classification — the central matching algorithm.
//!
//! The original portal expressed this as one SQL `UNION ALL` of
//! near-identical subqueries; here it is an explicit ordered list of
//! predicate checks over three in-memory record sets (approved members,
//! pending registrations, approved registration history), so precedence
//! and short-circuiting stay visible and testable without a database.
//!
//! | Tier | Meaning |
//! |------|---------|
//! | `approved_same`      | approved member, same account, name + DOB |
//! | `pending_same`       | pending registration, same account, name + DOB |
//! | `approved_different` | approved member, another account, name + DOB |
//! | `pending_different`  | pending registration, another account, name + DOB |
//! | `approved_elsewhere` | historical: approved registration, another account |
//! | `approved_same_name` | same account, same name, different DOB |
//! | `pending_same_name`  | same account, same name, different DOB, pending |
//!
//! First non-empty tier wins. Every tier except `approved_elsewhere`
//! blocks submission.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{person::NameKey, relationship::Relationship};

// ─── Classification ──────────────────────────────────────────────────────────

/// The mutually exclusive duplicate tiers, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTier {
  ApprovedSame,
  PendingSame,
  ApprovedDifferent,
  PendingDifferent,
  ApprovedElsewhere,
  ApprovedSameName,
  PendingSameName,
}

impl DuplicateTier {
  /// Whether a submission hitting this tier is refused. `ApprovedElsewhere`
  /// is historical and informational only: if the person is still active
  /// under another account, the live record already matched an earlier
  /// tier.
  pub fn blocks_submission(self) -> bool {
    !matches!(self, Self::ApprovedElsewhere)
  }
}

/// A classified duplicate. Carries who holds the conflicting record and
/// under what relationship; rendering user-facing copy is the caller's
/// job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateMatch {
  pub tier:                     DuplicateTier,
  pub conflicting_account:      String,
  pub conflicting_relationship: Relationship,
}

// ─── Record view ─────────────────────────────────────────────────────────────

/// One existing row as the classifier sees it, whatever table it came
/// from.
#[derive(Debug, Clone)]
pub struct ExistingRecord {
  pub account_id:    Uuid,
  /// Display name of the owning account, for duplicate reports.
  pub account_name:  String,
  pub key:           NameKey,
  pub date_of_birth: NaiveDate,
  pub relationship:  Relationship,
}

impl ExistingRecord {
  fn to_match(&self, tier: DuplicateTier) -> DuplicateMatch {
    DuplicateMatch {
      tier,
      conflicting_account:      self.account_name.clone(),
      conflicting_relationship: self.relationship.clone(),
    }
  }
}

// ─── Classifiers ─────────────────────────────────────────────────────────────

/// Authoritative classification of a candidate identity against every
/// active record system-wide, plus the approved-registration history.
///
/// `approved` and `pending` span all accounts; `approved_history` holds
/// registrations that were themselves approved (the row left behind by a
/// promotion). Rejected registrations must not be passed in at all.
pub fn classify(
  key:              &NameKey,
  date_of_birth:    NaiveDate,
  account_id:       Uuid,
  approved:         &[ExistingRecord],
  pending:          &[ExistingRecord],
  approved_history: &[ExistingRecord],
) -> Option<DuplicateMatch> {
  let exact =
    |r: &&ExistingRecord| r.key == *key && r.date_of_birth == date_of_birth;
  let same = |r: &&ExistingRecord| r.account_id == account_id;
  let name_only =
    |r: &&ExistingRecord| r.key == *key && r.date_of_birth != date_of_birth;

  approved
    .iter()
    .find(|r| same(r) && exact(r))
    .map(|r| r.to_match(DuplicateTier::ApprovedSame))
    .or_else(|| {
      pending
        .iter()
        .find(|r| same(r) && exact(r))
        .map(|r| r.to_match(DuplicateTier::PendingSame))
    })
    .or_else(|| {
      approved
        .iter()
        .find(|r| !same(r) && exact(r))
        .map(|r| r.to_match(DuplicateTier::ApprovedDifferent))
    })
    .or_else(|| {
      pending
        .iter()
        .find(|r| !same(r) && exact(r))
        .map(|r| r.to_match(DuplicateTier::PendingDifferent))
    })
    .or_else(|| {
      approved_history
        .iter()
        .find(|r| !same(r) && exact(r))
        .map(|r| r.to_match(DuplicateTier::ApprovedElsewhere))
    })
    .or_else(|| {
      approved
        .iter()
        .find(|r| same(r) && name_only(r))
        .map(|r| r.to_match(DuplicateTier::ApprovedSameName))
    })
    .or_else(|| {
      pending
        .iter()
        .find(|r| same(r) && name_only(r))
        .map(|r| r.to_match(DuplicateTier::PendingSameName))
    })
}

/// Lightweight name-only classification for live-typing feedback.
///
/// Scoped to the submitting account and advisory by contract: it may race
/// with concurrent submissions and must never be the sole gate before an
/// insert.
pub fn classify_name_only(
  key:        &NameKey,
  account_id: Uuid,
  approved:   &[ExistingRecord],
  pending:    &[ExistingRecord],
) -> Option<DuplicateMatch> {
  let mine = |r: &&ExistingRecord| r.account_id == account_id && r.key == *key;

  approved
    .iter()
    .find(mine)
    .map(|r| r.to_match(DuplicateTier::ApprovedSameName))
    .or_else(|| {
      pending
        .iter()
        .find(mine)
        .map(|r| r.to_match(DuplicateTier::PendingSameName))
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn key() -> NameKey { NameKey::new("Juan", Some('D'), "Cruz") }

  fn dob() -> NaiveDate { NaiveDate::from_ymd_opt(1990, 5, 1).unwrap() }

  fn record(account_id: Uuid, name: &str, birth: NaiveDate) -> ExistingRecord {
    ExistingRecord {
      account_id,
      account_name:  name.to_string(),
      key:           key(),
      date_of_birth: birth,
      relationship:  Relationship::Child,
    }
  }

  #[test]
  fn no_records_no_duplicate() {
    let account = Uuid::new_v4();
    assert_eq!(classify(&key(), dob(), account, &[], &[], &[]), None);
  }

  #[test]
  fn approved_same_account_wins() {
    let account = Uuid::new_v4();
    let hit = classify(
      &key(),
      dob(),
      account,
      &[record(account, "Reyes household", dob())],
      &[],
      &[],
    )
    .unwrap();
    assert_eq!(hit.tier, DuplicateTier::ApprovedSame);
    assert_eq!(hit.conflicting_account, "Reyes household");
  }

  #[test]
  fn same_account_beats_different_account() {
    let account = Uuid::new_v4();
    let other = Uuid::new_v4();
    // Both an approved record elsewhere and a pending record here exist;
    // precedence puts pending_same above approved_different only when the
    // same-account tier is approved. Here the same-account hit is pending.
    let hit = classify(
      &key(),
      dob(),
      account,
      &[record(other, "Santos household", dob())],
      &[record(account, "Reyes household", dob())],
      &[],
    )
    .unwrap();
    assert_eq!(hit.tier, DuplicateTier::PendingSame);
  }

  #[test]
  fn different_account_approved_classified() {
    let account = Uuid::new_v4();
    let other = Uuid::new_v4();
    let hit = classify(
      &key(),
      dob(),
      account,
      &[record(other, "Santos household", dob())],
      &[],
      &[],
    )
    .unwrap();
    assert_eq!(hit.tier, DuplicateTier::ApprovedDifferent);
    assert_eq!(hit.conflicting_account, "Santos household");
  }

  #[test]
  fn different_account_pending_classified() {
    let account = Uuid::new_v4();
    let other = Uuid::new_v4();
    let hit = classify(
      &key(),
      dob(),
      account,
      &[],
      &[record(other, "Santos household", dob())],
      &[],
    )
    .unwrap();
    assert_eq!(hit.tier, DuplicateTier::PendingDifferent);
  }

  #[test]
  fn historical_approval_is_informational() {
    let account = Uuid::new_v4();
    let other = Uuid::new_v4();
    let hit = classify(
      &key(),
      dob(),
      account,
      &[],
      &[],
      &[record(other, "Santos household", dob())],
    )
    .unwrap();
    assert_eq!(hit.tier, DuplicateTier::ApprovedElsewhere);
    assert!(!hit.tier.blocks_submission());
  }

  #[test]
  fn same_name_different_dob_same_account() {
    let account = Uuid::new_v4();
    let other_dob = NaiveDate::from_ymd_opt(1992, 1, 1).unwrap();
    let hit = classify(
      &key(),
      dob(),
      account,
      &[record(account, "Reyes household", other_dob)],
      &[],
      &[],
    )
    .unwrap();
    assert_eq!(hit.tier, DuplicateTier::ApprovedSameName);
    assert!(hit.tier.blocks_submission());
  }

  #[test]
  fn same_name_different_dob_other_account_is_clear() {
    // Name-only matching is scoped to the submitting account.
    let account = Uuid::new_v4();
    let other = Uuid::new_v4();
    let other_dob = NaiveDate::from_ymd_opt(1992, 1, 1).unwrap();
    assert_eq!(
      classify(
        &key(),
        dob(),
        account,
        &[record(other, "Santos household", other_dob)],
        &[],
        &[],
      ),
      None
    );
  }

  #[test]
  fn exact_tiers_beat_name_only_tiers() {
    let account = Uuid::new_v4();
    let other = Uuid::new_v4();
    let other_dob = NaiveDate::from_ymd_opt(1992, 1, 1).unwrap();
    let hit = classify(
      &key(),
      dob(),
      account,
      &[record(account, "Reyes household", other_dob)],
      &[record(other, "Santos household", dob())],
      &[],
    )
    .unwrap();
    assert_eq!(hit.tier, DuplicateTier::PendingDifferent);
  }

  #[test]
  fn live_check_only_sees_own_account() {
    let account = Uuid::new_v4();
    let other = Uuid::new_v4();

    let hit = classify_name_only(
      &key(),
      account,
      &[record(account, "Reyes household", dob())],
      &[],
    )
    .unwrap();
    assert_eq!(hit.tier, DuplicateTier::ApprovedSameName);

    assert_eq!(
      classify_name_only(
        &key(),
        account,
        &[record(other, "Santos household", dob())],
        &[],
      ),
      None
    );
  }
}
