//! [`SqliteStore`] — the SQLite implementation of [`RegistryStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use kasama_core::{
  duplicate::{DuplicateMatch, ExistingRecord, classify, classify_name_only},
  person::NameKey,
  registration::{
    Account, FamilyMember, NewRegistration, Registration, RegistrationStatus,
  },
  store::{PendingScope, RegistryStore, SubmitOutcome},
};

use crate::{
  Error, Result,
  encode::{
    RawAccount, RawExisting, RawMember, RawPerson, RawRegistration, encode_date,
    encode_dt, encode_relationship, encode_suffix, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Row mapping ─────────────────────────────────────────────────────────────

const REGISTRATION_COLS: &str = "registration_id, account_id, first_name, \
   middle_initial, last_name, suffix, relationship, relationship_detail, \
   date_of_birth, photo, status, submitted_at, decided_at, rejection_reason";

fn raw_registration_row(row: &rusqlite::Row) -> rusqlite::Result<RawRegistration> {
  Ok(RawRegistration {
    registration_id:  row.get(0)?,
    account_id:       row.get(1)?,
    person:           RawPerson {
      first_name:          row.get(2)?,
      middle_initial:      row.get(3)?,
      last_name:           row.get(4)?,
      suffix:              row.get(5)?,
      relationship:        row.get(6)?,
      relationship_detail: row.get(7)?,
      date_of_birth:       row.get(8)?,
    },
    photo:            row.get(9)?,
    status:           row.get(10)?,
    submitted_at:     row.get(11)?,
    decided_at:       row.get(12)?,
    rejection_reason: row.get(13)?,
  })
}

fn raw_existing_row(row: &rusqlite::Row) -> rusqlite::Result<RawExisting> {
  Ok(RawExisting {
    account_id:          row.get(0)?,
    account_name:        row.get(1)?,
    first_key:           row.get(2)?,
    middle_key:          row.get(3)?,
    last_key:            row.get(4)?,
    date_of_birth:       row.get(5)?,
    relationship:        row.get(6)?,
    relationship_detail: row.get(7)?,
  })
}

// ─── Conflict-set queries ────────────────────────────────────────────────────

const MEMBERS_BY_KEY: &str = "SELECT m.account_id, a.display_name, \
   m.first_key, m.middle_key, m.last_key, m.date_of_birth, \
   m.relationship, m.relationship_detail \
   FROM family_members m JOIN accounts a ON a.account_id = m.account_id \
   WHERE m.first_key = ?1 AND m.middle_key = ?2 AND m.last_key = ?3";

const REGISTRATIONS_BY_KEY: &str = "SELECT r.account_id, a.display_name, \
   r.first_key, r.middle_key, r.last_key, r.date_of_birth, \
   r.relationship, r.relationship_detail \
   FROM registrations r JOIN accounts a ON a.account_id = r.account_id \
   WHERE r.first_key = ?1 AND r.middle_key = ?2 AND r.last_key = ?3 \
     AND r.status = ?4";

/// Fetch every row sharing the normalized key: approved members, pending
/// registrations, and approved registration history. Rejected rows never
/// participate.
fn conflict_sets(
  conn: &rusqlite::Connection,
  key:  &NameKey,
) -> rusqlite::Result<(Vec<RawExisting>, Vec<RawExisting>, Vec<RawExisting>)> {
  let mut stmt = conn.prepare(MEMBERS_BY_KEY)?;
  let members = stmt
    .query_map(
      rusqlite::params![key.first, key.middle, key.last],
      raw_existing_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(REGISTRATIONS_BY_KEY)?;
  let pending = stmt
    .query_map(
      rusqlite::params![key.first, key.middle, key.last, "pending"],
      raw_existing_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(REGISTRATIONS_BY_KEY)?;
  let history = stmt
    .query_map(
      rusqlite::params![key.first, key.middle, key.last, "approved"],
      raw_existing_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok((members, pending, history))
}

fn decode_existing(raws: Vec<RawExisting>) -> Result<Vec<ExistingRecord>> {
  raws.into_iter().map(RawExisting::into_existing).collect()
}

/// Wrap a store error for transport out of a `tokio_rusqlite` closure.
fn boxed(e: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

/// What happened inside the serialized submit closure.
enum SubmitProbe {
  NoAccount,
  Blocked(DuplicateMatch),
  Inserted(Option<DuplicateMatch>),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A family registry backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All
/// closures run sequentially on the connection's dedicated thread, which
/// is what serializes check-then-insert across concurrent submissions.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  type Error = Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn add_account(&self, display_name: String) -> Result<Account> {
    let account = Account {
      account_id: Uuid::new_v4(),
      display_name,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(account.account_id);
    let at_str   = encode_dt(account.created_at);
    let name     = account.display_name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO accounts (account_id, display_name, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(account)
  }

  async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT account_id, display_name, created_at
               FROM accounts WHERE account_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawAccount {
                  account_id:   row.get(0)?,
                  display_name: row.get(1)?,
                  created_at:   row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  // ── Registration queue ────────────────────────────────────────────────────

  async fn submit(&self, input: NewRegistration) -> Result<SubmitOutcome> {
    let registration = Registration {
      registration_id: Uuid::new_v4(),
      account_id:      input.account_id,
      person:          input.person,
      photo:           input.photo,
      submitted_at:    Utc::now(),
      status:          RegistrationStatus::Pending,
    };

    let key        = registration.person.key();
    let account_id = registration.account_id;
    let dob        = registration.person.date_of_birth;

    let reg_id_str  = encode_uuid(registration.registration_id);
    let acct_str    = encode_uuid(account_id);
    let first       = registration.person.first_name.clone();
    let middle      = registration.person.middle_initial.map(String::from);
    let last        = registration.person.last_name.clone();
    let suffix      = registration.person.suffix.map(encode_suffix);
    let (rel, rel_detail) = encode_relationship(&registration.person.relationship);
    let dob_str     = encode_date(dob);
    let photo       = registration.photo.clone();
    let at_str      = encode_dt(registration.submitted_at);
    let key_in      = key.clone();

    let probe: SubmitProbe = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let account_known: bool = tx
          .query_row(
            "SELECT 1 FROM accounts WHERE account_id = ?1",
            rusqlite::params![acct_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !account_known {
          return Ok(SubmitProbe::NoAccount);
        }

        let (members, pending, history) = conflict_sets(&tx, &key_in)?;
        let members = decode_existing(members).map_err(boxed)?;
        let pending = decode_existing(pending).map_err(boxed)?;
        let history = decode_existing(history).map_err(boxed)?;

        let mut informational = None;
        if let Some(hit) =
          classify(&key_in, dob, account_id, &members, &pending, &history)
        {
          if hit.tier.blocks_submission() {
            return Ok(SubmitProbe::Blocked(hit));
          }
          informational = Some(hit);
        }

        tx.execute(
          "INSERT INTO registrations (
             registration_id, account_id,
             first_name, middle_initial, last_name, suffix,
             first_key, middle_key, last_key,
             relationship, relationship_detail, date_of_birth,
             photo, status, submitted_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                     ?13, 'pending', ?14)",
          rusqlite::params![
            reg_id_str,
            acct_str,
            first,
            middle,
            last,
            suffix,
            key_in.first,
            key_in.middle,
            key_in.last,
            rel,
            rel_detail,
            dob_str,
            photo,
            at_str,
          ],
        )?;
        tx.commit()?;

        Ok(SubmitProbe::Inserted(informational))
      })
      .await?;

    match probe {
      SubmitProbe::NoAccount => Err(Error::AccountNotFound(account_id)),
      SubmitProbe::Blocked(hit) => Ok(SubmitOutcome::Blocked(hit)),
      SubmitProbe::Inserted(informational) => {
        if let Some(hit) = informational {
          tracing::info!(
            tier = ?hit.tier,
            conflicting_account = %hit.conflicting_account,
            "identity was previously approved under another account; \
             accepting submission"
          );
        }
        Ok(SubmitOutcome::Accepted(registration))
      }
    }
  }

  async fn withdraw(
    &self,
    registration_id: Uuid,
    account_id: Uuid,
  ) -> Result<Option<Registration>> {
    let id_str   = encode_uuid(registration_id);
    let acct_str = encode_uuid(account_id);

    let raw: Option<RawRegistration> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Only the owner may withdraw, and only while still pending.
        let raw = tx
          .query_row(
            &format!(
              "SELECT {REGISTRATION_COLS} FROM registrations
               WHERE registration_id = ?1 AND account_id = ?2
                 AND status = 'pending'"
            ),
            rusqlite::params![id_str, acct_str],
            raw_registration_row,
          )
          .optional()?;

        if raw.is_some() {
          tx.execute(
            "DELETE FROM registrations WHERE registration_id = ?1",
            rusqlite::params![id_str],
          )?;
        }
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawRegistration::into_registration).transpose()
  }

  async fn list_pending(&self, scope: PendingScope) -> Result<Vec<Registration>> {
    let acct_str = match scope {
      PendingScope::Account(id) => Some(encode_uuid(id)),
      PendingScope::All         => None,
    };

    let raws: Vec<RawRegistration> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(acct) = acct_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {REGISTRATION_COLS} FROM registrations
             WHERE status = 'pending' AND account_id = ?1
             ORDER BY submitted_at DESC"
          ))?;
          stmt
            .query_map(rusqlite::params![acct], raw_registration_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {REGISTRATION_COLS} FROM registrations
             WHERE status = 'pending'
             ORDER BY submitted_at DESC"
          ))?;
          stmt
            .query_map([], raw_registration_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawRegistration::into_registration)
      .collect()
  }

  // ── Approval state machine ────────────────────────────────────────────────

  async fn approve(&self, registration_id: Uuid) -> Result<Option<FamilyMember>> {
    let member_id   = Uuid::new_v4();
    let approved_at = Utc::now();

    let id_str        = encode_uuid(registration_id);
    let member_id_str = encode_uuid(member_id);
    let at_str        = encode_dt(approved_at);

    let raw: Option<RawRegistration> = self
      .conn
      .call(move |conn| {
        let tx =
          conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let raw = tx
          .query_row(
            &format!(
              "SELECT {REGISTRATION_COLS} FROM registrations
               WHERE registration_id = ?1 AND status = 'pending'"
            ),
            rusqlite::params![id_str],
            raw_registration_row,
          )
          .optional()?;
        if raw.is_none() {
          return Ok(None);
        }

        // Member insert and status flip commit or abort together.
        tx.execute(
          "INSERT INTO family_members (
             member_id, account_id, registration_id,
             first_name, middle_initial, last_name, suffix,
             first_key, middle_key, last_key,
             relationship, relationship_detail, date_of_birth, approved_at
           )
           SELECT ?1, account_id, registration_id,
                  first_name, middle_initial, last_name, suffix,
                  first_key, middle_key, last_key,
                  relationship, relationship_detail, date_of_birth, ?2
           FROM registrations WHERE registration_id = ?3",
          rusqlite::params![member_id_str, at_str, id_str],
        )?;
        tx.execute(
          "UPDATE registrations SET status = 'approved', decided_at = ?2
           WHERE registration_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        tx.commit()?;

        Ok(raw)
      })
      .await?;

    let Some(raw) = raw else { return Ok(None) };
    let registration = raw.into_registration()?;

    Ok(Some(FamilyMember {
      member_id,
      account_id: registration.account_id,
      person: registration.person,
      registration_id,
      approved_at,
    }))
  }

  async fn reject(
    &self,
    registration_id: Uuid,
    reason: String,
  ) -> Result<Option<Registration>> {
    let id_str = encode_uuid(registration_id);
    let at_str = encode_dt(Utc::now());

    let raw: Option<RawRegistration> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let changed = tx.execute(
          "UPDATE registrations
           SET status = 'rejected', rejection_reason = ?2, decided_at = ?3
           WHERE registration_id = ?1 AND status = 'pending'",
          rusqlite::params![id_str, reason, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }

        let raw = tx
          .query_row(
            &format!(
              "SELECT {REGISTRATION_COLS} FROM registrations
               WHERE registration_id = ?1"
            ),
            rusqlite::params![id_str],
            raw_registration_row,
          )
          .optional()?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawRegistration::into_registration).transpose()
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_members(&self, account_id: Uuid) -> Result<Vec<FamilyMember>> {
    let acct_str = encode_uuid(account_id);

    let raws: Vec<RawMember> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT member_id, account_id, registration_id,
                  first_name, middle_initial, last_name, suffix,
                  relationship, relationship_detail, date_of_birth,
                  approved_at
           FROM family_members WHERE account_id = ?1
           ORDER BY approved_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![acct_str], |row| {
            Ok(RawMember {
              member_id:       row.get(0)?,
              account_id:      row.get(1)?,
              registration_id: row.get(2)?,
              person:          RawPerson {
                first_name:          row.get(3)?,
                middle_initial:      row.get(4)?,
                last_name:           row.get(5)?,
                suffix:              row.get(6)?,
                relationship:        row.get(7)?,
                relationship_detail: row.get(8)?,
                date_of_birth:       row.get(9)?,
              },
              approved_at:     row.get(10)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMember::into_member).collect()
  }

  async fn check_duplicate(
    &self,
    account_id: Uuid,
    key: NameKey,
    date_of_birth: NaiveDate,
  ) -> Result<Option<DuplicateMatch>> {
    let key_in = key.clone();
    let (members, pending, history) = self
      .conn
      .call(move |conn| Ok(conflict_sets(conn, &key_in)?))
      .await?;

    let members = decode_existing(members)?;
    let pending = decode_existing(pending)?;
    let history = decode_existing(history)?;

    Ok(classify(
      &key,
      date_of_birth,
      account_id,
      &members,
      &pending,
      &history,
    ))
  }

  async fn check_name(
    &self,
    account_id: Uuid,
    key: NameKey,
  ) -> Result<Option<DuplicateMatch>> {
    let key_in = key.clone();
    let (members, pending, _history) = self
      .conn
      .call(move |conn| Ok(conflict_sets(conn, &key_in)?))
      .await?;

    let members = decode_existing(members)?;
    let pending = decode_existing(pending)?;

    Ok(classify_name_only(&key, account_id, &members, &pending))
  }
}
