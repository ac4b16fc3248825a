//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use kasama_core::{
  duplicate::DuplicateTier,
  person::Person,
  registration::{NewRegistration, RegistrationStatus},
  relationship::Relationship,
  store::{PendingScope, RegistryStore, SubmitOutcome},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn person(first: &str, last: &str, dob: (i32, u32, u32)) -> Person {
  Person {
    first_name:     first.to_string(),
    middle_initial: Some('D'),
    last_name:      last.to_string(),
    suffix:         None,
    relationship:   Relationship::Child,
    date_of_birth:  NaiveDate::from_ymd_opt(dob.0, dob.1, dob.2).unwrap(),
  }
}

fn juan() -> Person { person("Juan", "Cruz", (1990, 5, 1)) }

fn registration(account_id: Uuid, p: Person) -> NewRegistration {
  NewRegistration { account_id, person: p, photo: None }
}

/// Unwrap an accepted submission or panic with the blocking tier.
fn accepted(outcome: SubmitOutcome) -> kasama_core::registration::Registration {
  match outcome {
    SubmitOutcome::Accepted(r) => r,
    SubmitOutcome::Blocked(hit) => panic!("blocked: {:?}", hit.tier),
  }
}

fn blocked_tier(outcome: SubmitOutcome) -> DuplicateTier {
  match outcome {
    SubmitOutcome::Blocked(hit) => hit.tier,
    SubmitOutcome::Accepted(r) => panic!("accepted: {}", r.registration_id),
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_and_list_pending() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();

  let reg = accepted(
    s.submit(registration(account.account_id, juan())).await.unwrap(),
  );
  assert_eq!(reg.account_id, account.account_id);
  assert!(reg.status.is_pending());

  let queue = s
    .list_pending(PendingScope::Account(account.account_id))
    .await
    .unwrap();
  assert_eq!(queue.len(), 1);
  assert_eq!(queue[0].registration_id, reg.registration_id);
}

#[tokio::test]
async fn submit_unknown_account_is_an_error() {
  let s = store().await;
  let result = s.submit(registration(Uuid::new_v4(), juan())).await;
  assert!(matches!(result, Err(crate::Error::AccountNotFound(_))));
}

#[tokio::test]
async fn list_pending_newest_first() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();

  accepted(
    s.submit(registration(account.account_id, juan())).await.unwrap(),
  );
  tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  let second = accepted(
    s.submit(registration(account.account_id, person("Maria", "Cruz", (1992, 2, 2))))
      .await
      .unwrap(),
  );

  let queue = s
    .list_pending(PendingScope::Account(account.account_id))
    .await
    .unwrap();
  assert_eq!(queue.len(), 2);
  assert_eq!(queue[0].registration_id, second.registration_id);
}

#[tokio::test]
async fn reviewer_scope_spans_accounts() {
  let s = store().await;
  let a = s.add_account("Reyes household".into()).await.unwrap();
  let b = s.add_account("Santos household".into()).await.unwrap();

  accepted(s.submit(registration(a.account_id, juan())).await.unwrap());
  accepted(
    s.submit(registration(b.account_id, person("Maria", "Santos", (1985, 3, 3))))
      .await
      .unwrap(),
  );

  let all = s.list_pending(PendingScope::All).await.unwrap();
  assert_eq!(all.len(), 2);

  let mine = s.list_pending(PendingScope::Account(a.account_id)).await.unwrap();
  assert_eq!(mine.len(), 1);
}

// ─── Duplicate tiers ─────────────────────────────────────────────────────────

#[tokio::test]
async fn pending_same_account_blocks_resubmission() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();

  accepted(s.submit(registration(account.account_id, juan())).await.unwrap());
  let tier = blocked_tier(
    s.submit(registration(account.account_id, juan())).await.unwrap(),
  );
  assert_eq!(tier, DuplicateTier::PendingSame);
}

#[tokio::test]
async fn approved_same_account_blocks_resubmission() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();

  let reg = accepted(
    s.submit(registration(account.account_id, juan())).await.unwrap(),
  );
  s.approve(reg.registration_id).await.unwrap().unwrap();

  let tier = blocked_tier(
    s.submit(registration(account.account_id, juan())).await.unwrap(),
  );
  assert_eq!(tier, DuplicateTier::ApprovedSame);
}

#[tokio::test]
async fn other_accounts_records_block_with_their_own_tiers() {
  let s = store().await;
  let a = s.add_account("Reyes household".into()).await.unwrap();
  let b = s.add_account("Santos household".into()).await.unwrap();

  let reg = accepted(s.submit(registration(a.account_id, juan())).await.unwrap());

  // A's copy is still pending.
  let outcome = s.submit(registration(b.account_id, juan())).await.unwrap();
  let SubmitOutcome::Blocked(hit) = outcome else {
    panic!("expected a blocked submission");
  };
  assert_eq!(hit.tier, DuplicateTier::PendingDifferent);
  assert_eq!(hit.conflicting_account, "Reyes household");

  // Once approved, the tier shifts — and is never approved_same.
  s.approve(reg.registration_id).await.unwrap().unwrap();
  let tier = blocked_tier(s.submit(registration(b.account_id, juan())).await.unwrap());
  assert_eq!(tier, DuplicateTier::ApprovedDifferent);
}

#[tokio::test]
async fn same_name_different_birth_date_blocks_same_account() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();

  accepted(s.submit(registration(account.account_id, juan())).await.unwrap());

  let twin = person("Juan", "Cruz", (1993, 7, 7));
  let tier = blocked_tier(
    s.submit(registration(account.account_id, twin)).await.unwrap(),
  );
  assert_eq!(tier, DuplicateTier::PendingSameName);
}

#[tokio::test]
async fn same_name_different_birth_date_other_account_is_clear() {
  let s = store().await;
  let a = s.add_account("Reyes household".into()).await.unwrap();
  let b = s.add_account("Santos household".into()).await.unwrap();

  accepted(s.submit(registration(a.account_id, juan())).await.unwrap());

  let other = person("Juan", "Cruz", (1993, 7, 7));
  accepted(s.submit(registration(b.account_id, other)).await.unwrap());
}

#[tokio::test]
async fn matching_is_case_insensitive() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();

  accepted(s.submit(registration(account.account_id, juan())).await.unwrap());

  let shouted = person("JUAN", "CRUZ", (1990, 5, 1));
  let tier = blocked_tier(
    s.submit(registration(account.account_id, shouted)).await.unwrap(),
  );
  assert_eq!(tier, DuplicateTier::PendingSame);
}

#[tokio::test]
async fn rejected_records_never_block() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();

  let reg = accepted(
    s.submit(registration(account.account_id, juan())).await.unwrap(),
  );
  s.reject(reg.registration_id, "no proof of residency".into())
    .await
    .unwrap()
    .unwrap();

  // Identical resubmission goes straight through.
  accepted(s.submit(registration(account.account_id, juan())).await.unwrap());
}

#[tokio::test]
async fn concurrent_identical_submissions_accept_exactly_one() {
  let s = store().await;
  let a = s.add_account("Reyes household".into()).await.unwrap();
  let b = s.add_account("Santos household".into()).await.unwrap();

  let s1 = s.clone();
  let s2 = s.clone();
  let (left, right) = tokio::join!(
    s1.submit(registration(a.account_id, juan())),
    s2.submit(registration(b.account_id, juan())),
  );

  let outcomes = [left.unwrap(), right.unwrap()];
  let accepted_count = outcomes
    .iter()
    .filter(|o| matches!(o, SubmitOutcome::Accepted(_)))
    .count();
  assert_eq!(accepted_count, 1);

  let all = s.list_pending(PendingScope::All).await.unwrap();
  assert_eq!(all.len(), 1);
}

// ─── Withdrawal ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn withdraw_pending_removes_it() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();

  let reg = accepted(
    s.submit(registration(account.account_id, juan())).await.unwrap(),
  );

  let withdrawn = s
    .withdraw(reg.registration_id, account.account_id)
    .await
    .unwrap();
  assert!(withdrawn.is_some());

  let queue = s
    .list_pending(PendingScope::Account(account.account_id))
    .await
    .unwrap();
  assert!(queue.is_empty());

  // A second withdrawal finds nothing.
  let again = s
    .withdraw(reg.registration_id, account.account_id)
    .await
    .unwrap();
  assert!(again.is_none());
}

#[tokio::test]
async fn withdraw_requires_ownership() {
  let s = store().await;
  let a = s.add_account("Reyes household".into()).await.unwrap();
  let b = s.add_account("Santos household".into()).await.unwrap();

  let reg = accepted(s.submit(registration(a.account_id, juan())).await.unwrap());

  let stolen = s.withdraw(reg.registration_id, b.account_id).await.unwrap();
  assert!(stolen.is_none());

  // Still in A's queue.
  let queue = s.list_pending(PendingScope::Account(a.account_id)).await.unwrap();
  assert_eq!(queue.len(), 1);
}

#[tokio::test]
async fn withdraw_is_not_a_cancellation_of_a_decision() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();

  let approved_reg = accepted(
    s.submit(registration(account.account_id, juan())).await.unwrap(),
  );
  s.approve(approved_reg.registration_id).await.unwrap().unwrap();
  assert!(
    s.withdraw(approved_reg.registration_id, account.account_id)
      .await
      .unwrap()
      .is_none()
  );

  let rejected_reg = accepted(
    s.submit(
      registration(account.account_id, person("Maria", "Cruz", (1991, 1, 1))),
    )
    .await
    .unwrap(),
  );
  s.reject(rejected_reg.registration_id, "duplicate paperwork".into())
    .await
    .unwrap()
    .unwrap();
  assert!(
    s.withdraw(rejected_reg.registration_id, account.account_id)
      .await
      .unwrap()
      .is_none()
  );
}

// ─── Approval state machine ──────────────────────────────────────────────────

#[tokio::test]
async fn approve_promotes_into_family_members() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();

  let reg = accepted(
    s.submit(registration(account.account_id, juan())).await.unwrap(),
  );
  let member = s.approve(reg.registration_id).await.unwrap().unwrap();

  assert_eq!(member.account_id, account.account_id);
  assert_eq!(member.registration_id, reg.registration_id);
  assert_eq!(member.person, juan());

  let members = s.list_members(account.account_id).await.unwrap();
  assert_eq!(members.len(), 1);
  assert_eq!(members[0].member_id, member.member_id);

  // Out of the pending queue, into history.
  let queue = s
    .list_pending(PendingScope::Account(account.account_id))
    .await
    .unwrap();
  assert!(queue.is_empty());
}

#[tokio::test]
async fn approval_reclassifies_the_identity() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();
  let p = juan();

  let reg = accepted(
    s.submit(registration(account.account_id, p.clone())).await.unwrap(),
  );

  let hit = s
    .check_duplicate(account.account_id, p.key(), p.date_of_birth)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(hit.tier, DuplicateTier::PendingSame);

  s.approve(reg.registration_id).await.unwrap().unwrap();

  let hit = s
    .check_duplicate(account.account_id, p.key(), p.date_of_birth)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(hit.tier, DuplicateTier::ApprovedSame);
}

#[tokio::test]
async fn decisions_are_terminal() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();

  let reg = accepted(
    s.submit(registration(account.account_id, juan())).await.unwrap(),
  );
  s.approve(reg.registration_id).await.unwrap().unwrap();

  assert!(s.approve(reg.registration_id).await.unwrap().is_none());
  assert!(
    s.reject(reg.registration_id, "changed my mind".into())
      .await
      .unwrap()
      .is_none()
  );

  assert!(s.approve(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn reject_records_reason_and_timestamp() {
  let s = store().await;
  let account = s.add_account("Reyes household".into()).await.unwrap();

  let reg = accepted(
    s.submit(registration(account.account_id, juan())).await.unwrap(),
  );
  let rejected = s
    .reject(reg.registration_id, "no proof of residency".into())
    .await
    .unwrap()
    .unwrap();

  match rejected.status {
    RegistrationStatus::Rejected { reason, .. } => {
      assert_eq!(reason, "no proof of residency");
    }
    other => panic!("expected rejected, got {other:?}"),
  }

  let queue = s
    .list_pending(PendingScope::Account(account.account_id))
    .await
    .unwrap();
  assert!(queue.is_empty());
}

// ─── Advisory name check ─────────────────────────────────────────────────────

#[tokio::test]
async fn name_check_sees_own_records_only() {
  let s = store().await;
  let a = s.add_account("Reyes household".into()).await.unwrap();
  let b = s.add_account("Santos household".into()).await.unwrap();
  let p = juan();

  accepted(s.submit(registration(a.account_id, p.clone())).await.unwrap());

  let hit = s.check_name(a.account_id, p.key()).await.unwrap().unwrap();
  assert_eq!(hit.tier, DuplicateTier::PendingSameName);

  // The same name under another account is not the resident's business
  // at live-typing time.
  assert!(s.check_name(b.account_id, p.key()).await.unwrap().is_none());
}
