//! Candidate intake and identity normalization.
//!
//! Raw form input arrives as a [`Candidate`]; [`Candidate::validate`] turns
//! it into a [`Person`] or a [`ValidationError`]. All duplicate comparisons
//! run over the derived [`NameKey`], never over the raw user-entered
//! strings.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{ValidationError, relationship::Relationship};

// ─── Suffix ──────────────────────────────────────────────────────────────────

/// Generational name suffix; closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suffix {
  Jr,
  Sr,
  II,
  III,
  IV,
  V,
}

impl Suffix {
  /// Parse a form value such as `"Jr."` or `"iii"`. Periods and case are
  /// ignored.
  pub fn parse(raw: &str) -> Result<Self, ValidationError> {
    match raw.trim().trim_end_matches('.').to_ascii_lowercase().as_str() {
      "jr"  => Ok(Self::Jr),
      "sr"  => Ok(Self::Sr),
      "ii"  => Ok(Self::II),
      "iii" => Ok(Self::III),
      "iv"  => Ok(Self::IV),
      "v"   => Ok(Self::V),
      _     => Err(ValidationError::UnknownSuffix(raw.to_string())),
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Jr  => "Jr.",
      Self::Sr  => "Sr.",
      Self::II  => "II",
      Self::III => "III",
      Self::IV  => "IV",
      Self::V   => "V",
    }
  }
}

// ─── Normalized key ──────────────────────────────────────────────────────────

/// The trimmed, case-folded name tuple used for every equality comparison.
///
/// `middle` is the empty string when no middle initial was given, so that
/// two candidates without one still compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameKey {
  pub first:  String,
  pub middle: String,
  pub last:   String,
}

impl NameKey {
  pub fn new(first: &str, middle: Option<char>, last: &str) -> Self {
    Self {
      first:  first.trim().to_lowercase(),
      middle: middle.map(|c| c.to_lowercase().collect()).unwrap_or_default(),
      last:   last.trim().to_lowercase(),
    }
  }
}

// ─── Candidate (raw input) ───────────────────────────────────────────────────

/// A proposed family member exactly as submitted, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
  pub first_name:         String,
  pub middle_initial:     Option<String>,
  pub last_name:          String,
  pub suffix:             Option<String>,
  /// Relationship label, e.g. `"child"` or `"other"`.
  pub relationship:       String,
  /// Free-text description; required when `relationship` is `"other"`.
  pub other_relationship: Option<String>,
  pub date_of_birth:      Option<NaiveDate>,
}

impl Candidate {
  /// Validate and normalize into a [`Person`].
  pub fn validate(&self) -> Result<Person, ValidationError> {
    let first_name = sanitize_name(&self.first_name, "first name")?;
    let last_name  = sanitize_name(&self.last_name, "last name")?;

    let middle_initial = match self.middle_initial.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(s) => {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
          (Some(c), None) if c.is_alphabetic() => Some(c.to_ascii_uppercase()),
          _ => return Err(ValidationError::BadMiddleInitial),
        }
      }
    };

    let suffix = match self.suffix.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(s)         => Some(Suffix::parse(s)?),
    };

    let relationship = Relationship::parse(
      &self.relationship,
      self.other_relationship.as_deref(),
    )?;

    let date_of_birth =
      self.date_of_birth.ok_or(ValidationError::MissingBirthDate)?;
    let today = Utc::now().date_naive();
    let age = today
      .years_since(date_of_birth)
      .ok_or(ValidationError::BirthDateInFuture)?;
    if age > 120 {
      return Err(ValidationError::AgeOutOfRange(age));
    }

    Ok(Person {
      first_name,
      middle_initial,
      last_name,
      suffix,
      relationship,
      date_of_birth,
    })
  }
}

// ─── Person (validated) ──────────────────────────────────────────────────────

/// A validated, normalized candidate — the only form the store accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
  pub first_name:     String,
  pub middle_initial: Option<char>,
  pub last_name:      String,
  pub suffix:         Option<Suffix>,
  pub relationship:   Relationship,
  pub date_of_birth:  NaiveDate,
}

impl Person {
  /// The normalized key this person is compared under.
  pub fn key(&self) -> NameKey {
    NameKey::new(&self.first_name, self.middle_initial, &self.last_name)
  }

  /// Human-readable name for notifications and duplicate reports,
  /// e.g. `"Juan D. Cruz Jr."`.
  pub fn display_name(&self) -> String {
    let mut out = self.first_name.clone();
    if let Some(m) = self.middle_initial {
      out.push(' ');
      out.push(m);
      out.push('.');
    }
    out.push(' ');
    out.push_str(&self.last_name);
    if let Some(s) = self.suffix {
      out.push(' ');
      out.push_str(s.as_str());
    }
    out
  }
}

// ─── Sanitization ────────────────────────────────────────────────────────────

/// Strip markup and disallowed characters from a name field.
///
/// Rejects names that contain digits or that are shorter than two letters
/// once sanitized. Letters here means Unicode letters, so names like
/// "Peña" or "Dela-Cruz" survive intact.
fn sanitize_name(
  raw:   &str,
  field: &'static str,
) -> Result<String, ValidationError> {
  let stripped = strip_tags(raw);

  if stripped.chars().any(|c| c.is_ascii_digit()) {
    return Err(ValidationError::NameHasDigit { field });
  }

  let kept: String = stripped
    .chars()
    .filter(|c| c.is_alphabetic() || *c == ' ' || *c == '-' || *c == '\'')
    .collect();

  let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");

  if collapsed.chars().filter(|c| c.is_alphabetic()).count() < 2 {
    return Err(ValidationError::NameTooShort { field });
  }

  Ok(collapsed)
}

/// Drop every `<...>` span, including unterminated trailing ones.
fn strip_tags(raw: &str) -> String {
  let mut out = String::with_capacity(raw.len());
  let mut in_tag = false;
  for c in raw.chars() {
    match c {
      '<' => in_tag = true,
      '>' if in_tag => in_tag = false,
      c if !in_tag => out.push(c),
      _ => {}
    }
  }
  out
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use chrono::{Datelike, Days, Utc};

  use super::*;

  fn candidate() -> Candidate {
    Candidate {
      first_name:         "Juan".into(),
      middle_initial:     Some("d".into()),
      last_name:          "Cruz".into(),
      suffix:             None,
      relationship:       "child".into(),
      other_relationship: None,
      date_of_birth:      NaiveDate::from_ymd_opt(1990, 5, 1),
    }
  }

  #[test]
  fn valid_candidate_normalizes() {
    let person = candidate().validate().unwrap();
    assert_eq!(person.first_name, "Juan");
    assert_eq!(person.middle_initial, Some('D'));
    assert_eq!(
      person.key(),
      NameKey {
        first:  "juan".into(),
        middle: "d".into(),
        last:   "cruz".into(),
      }
    );
    assert_eq!(person.display_name(), "Juan D. Cruz");
  }

  #[test]
  fn markup_is_stripped() {
    let mut c = candidate();
    c.first_name = "<b>Juan</b> <i>Miguel</i>".into();
    let person = c.validate().unwrap();
    assert_eq!(person.first_name, "Juan Miguel");
  }

  #[test]
  fn script_payload_with_digits_rejected() {
    let mut c = candidate();
    c.first_name = "<script>alert(1)</script>Juan".into();
    assert_eq!(
      c.validate(),
      Err(ValidationError::NameHasDigit { field: "first name" })
    );
  }

  #[test]
  fn digits_rejected() {
    let mut c = candidate();
    c.last_name = "Cruz2".into();
    assert_eq!(
      c.validate(),
      Err(ValidationError::NameHasDigit { field: "last name" })
    );
  }

  #[test]
  fn short_name_rejected() {
    let mut c = candidate();
    c.first_name = "J".into();
    assert_eq!(
      c.validate(),
      Err(ValidationError::NameTooShort { field: "first name" })
    );
  }

  #[test]
  fn punctuation_only_name_rejected() {
    let mut c = candidate();
    c.first_name = "--'".into();
    assert_eq!(
      c.validate(),
      Err(ValidationError::NameTooShort { field: "first name" })
    );
  }

  #[test]
  fn filipino_names_survive() {
    let mut c = candidate();
    c.first_name = "Ma. Peña".into();
    let person = c.validate().unwrap();
    // The period is dropped; the tilde-n is kept.
    assert_eq!(person.first_name, "Ma Peña");
  }

  #[test]
  fn middle_initial_must_be_one_letter() {
    let mut c = candidate();
    c.middle_initial = Some("DC".into());
    assert_eq!(c.validate(), Err(ValidationError::BadMiddleInitial));

    c.middle_initial = Some("4".into());
    assert_eq!(c.validate(), Err(ValidationError::BadMiddleInitial));

    c.middle_initial = Some("  ".into());
    assert_eq!(c.validate().unwrap().middle_initial, None);
  }

  #[test]
  fn suffix_closed_set() {
    let mut c = candidate();
    c.suffix = Some("Jr.".into());
    assert_eq!(c.validate().unwrap().suffix, Some(Suffix::Jr));

    c.suffix = Some("JR".into());
    assert_eq!(c.validate().unwrap().suffix, Some(Suffix::Jr));

    c.suffix = Some("Esq.".into());
    assert!(matches!(
      c.validate(),
      Err(ValidationError::UnknownSuffix(_))
    ));
  }

  #[test]
  fn missing_birth_date_rejected() {
    let mut c = candidate();
    c.date_of_birth = None;
    assert_eq!(c.validate(), Err(ValidationError::MissingBirthDate));
  }

  #[test]
  fn future_birth_date_rejected() {
    let mut c = candidate();
    c.date_of_birth = Utc::now().date_naive().checked_add_days(Days::new(2));
    assert_eq!(c.validate(), Err(ValidationError::BirthDateInFuture));
  }

  #[test]
  fn age_over_120_rejected() {
    let mut c = candidate();
    let today = Utc::now().date_naive();
    c.date_of_birth = NaiveDate::from_ymd_opt(today.year() - 130, 1, 1);
    assert!(matches!(
      c.validate(),
      Err(ValidationError::AgeOutOfRange(_))
    ));
  }

  #[test]
  fn key_ignores_case_and_padding() {
    let a = NameKey::new("  JUAN ", Some('d'), "Cruz");
    let b = NameKey::new("juan", Some('D'), " cruz ");
    assert_eq!(a, b);

    let without_middle = NameKey::new("juan", None, "cruz");
    assert_ne!(a, without_middle);
  }
}
