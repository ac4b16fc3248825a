//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, dates of birth as ISO 8601
//! dates, UUIDs as hyphenated lowercase strings. Relationships are split
//! into a closed-set label column plus a free-text detail column.

use chrono::{DateTime, NaiveDate, Utc};
use kasama_core::{
  duplicate::ExistingRecord,
  person::{NameKey, Person, Suffix},
  registration::{Account, FamilyMember, Registration, RegistrationStatus},
  relationship::Relationship,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Timestamps and dates ────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Suffix ──────────────────────────────────────────────────────────────────

pub fn encode_suffix(s: Suffix) -> &'static str { s.as_str() }

pub fn decode_suffix(s: &str) -> Result<Suffix> {
  Suffix::parse(s).map_err(|_| Error::Decode(format!("unknown suffix: {s:?}")))
}

// ─── Relationship ────────────────────────────────────────────────────────────

/// Split into (label, detail) column values.
pub fn encode_relationship(r: &Relationship) -> (&'static str, Option<String>) {
  match r {
    Relationship::Other(text) => ("other", Some(text.clone())),
    _ => (r.label(), None),
  }
}

pub fn decode_relationship(
  label:  &str,
  detail: Option<&str>,
) -> Result<Relationship> {
  match label {
    "spouse"      => Ok(Relationship::Spouse),
    "child"       => Ok(Relationship::Child),
    "parent"      => Ok(Relationship::Parent),
    "sibling"     => Ok(Relationship::Sibling),
    "grandparent" => Ok(Relationship::Grandparent),
    "grandchild"  => Ok(Relationship::Grandchild),
    "other" => match detail {
      Some(text) if !text.is_empty() => Ok(Relationship::Other(text.to_string())),
      _ => Err(Error::Decode("relationship 'other' without detail".into())),
    },
    other => Err(Error::Decode(format!("unknown relationship: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// The person columns shared by `registrations` and `family_members`.
pub struct RawPerson {
  pub first_name:          String,
  pub middle_initial:      Option<String>,
  pub last_name:           String,
  pub suffix:              Option<String>,
  pub relationship:        String,
  pub relationship_detail: Option<String>,
  pub date_of_birth:       String,
}

impl RawPerson {
  pub fn into_person(self) -> Result<Person> {
    let middle_initial = self
      .middle_initial
      .as_deref()
      .map(|s| {
        s.chars()
          .next()
          .ok_or_else(|| Error::Decode("empty middle initial column".into()))
      })
      .transpose()?;

    let suffix = self.suffix.as_deref().map(decode_suffix).transpose()?;

    Ok(Person {
      first_name: self.first_name,
      middle_initial,
      last_name: self.last_name,
      suffix,
      relationship: decode_relationship(
        &self.relationship,
        self.relationship_detail.as_deref(),
      )?,
      date_of_birth: decode_date(&self.date_of_birth)?,
    })
  }
}

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:   String,
  pub display_name: String,
  pub created_at:   String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:   decode_uuid(&self.account_id)?,
      display_name: self.display_name,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `registrations` row.
pub struct RawRegistration {
  pub registration_id:  String,
  pub account_id:       String,
  pub person:           RawPerson,
  pub photo:            Option<String>,
  pub status:           String,
  pub submitted_at:     String,
  pub decided_at:       Option<String>,
  pub rejection_reason: Option<String>,
}

impl RawRegistration {
  pub fn into_registration(self) -> Result<Registration> {
    let status = match self.status.as_str() {
      "pending" => RegistrationStatus::Pending,
      "approved" => RegistrationStatus::Approved {
        at: decode_dt(self.decided_at.as_deref().ok_or_else(|| {
          Error::Decode("approved row without decided_at".into())
        })?)?,
      },
      "rejected" => RegistrationStatus::Rejected {
        reason: self.rejection_reason.unwrap_or_default(),
        at:     decode_dt(self.decided_at.as_deref().ok_or_else(|| {
          Error::Decode("rejected row without decided_at".into())
        })?)?,
      },
      other => {
        return Err(Error::Decode(format!("unknown status: {other:?}")));
      }
    };

    Ok(Registration {
      registration_id: decode_uuid(&self.registration_id)?,
      account_id:      decode_uuid(&self.account_id)?,
      person:          self.person.into_person()?,
      photo:           self.photo,
      submitted_at:    decode_dt(&self.submitted_at)?,
      status,
    })
  }
}

/// Raw strings read directly from a `family_members` row.
pub struct RawMember {
  pub member_id:       String,
  pub account_id:      String,
  pub registration_id: String,
  pub person:          RawPerson,
  pub approved_at:     String,
}

impl RawMember {
  pub fn into_member(self) -> Result<FamilyMember> {
    Ok(FamilyMember {
      member_id:       decode_uuid(&self.member_id)?,
      account_id:      decode_uuid(&self.account_id)?,
      person:          self.person.into_person()?,
      registration_id: decode_uuid(&self.registration_id)?,
      approved_at:     decode_dt(&self.approved_at)?,
    })
  }
}

/// One row feeding the duplicate classifier, from either table.
pub struct RawExisting {
  pub account_id:          String,
  pub account_name:        String,
  pub first_key:           String,
  pub middle_key:          String,
  pub last_key:            String,
  pub date_of_birth:       String,
  pub relationship:        String,
  pub relationship_detail: Option<String>,
}

impl RawExisting {
  pub fn into_existing(self) -> Result<ExistingRecord> {
    Ok(ExistingRecord {
      account_id:    decode_uuid(&self.account_id)?,
      account_name:  self.account_name,
      key:           NameKey {
        first:  self.first_key,
        middle: self.middle_key,
        last:   self.last_key,
      },
      date_of_birth: decode_date(&self.date_of_birth)?,
      relationship:  decode_relationship(
        &self.relationship,
        self.relationship_detail.as_deref(),
      )?,
    })
  }
}
