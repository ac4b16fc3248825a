//! Relationship of a candidate to the submitting resident.

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Trimmed length limit for the free-text `Other` description.
pub const MAX_OTHER_LEN: usize = 64;

/// Closed set of household relationships, with a bounded free-text escape
/// hatch for anything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
  Spouse,
  Child,
  Parent,
  Sibling,
  Grandparent,
  Grandchild,
  Other(String),
}

impl Relationship {
  /// Parse a form label plus the optional free-text field that accompanies
  /// `"other"`.
  pub fn parse(
    label: &str,
    other: Option<&str>,
  ) -> Result<Self, ValidationError> {
    match label.trim().to_ascii_lowercase().as_str() {
      "spouse"      => Ok(Self::Spouse),
      "child"       => Ok(Self::Child),
      "parent"      => Ok(Self::Parent),
      "sibling"     => Ok(Self::Sibling),
      "grandparent" => Ok(Self::Grandparent),
      "grandchild"  => Ok(Self::Grandchild),
      "other" => {
        let text = other.map(str::trim).unwrap_or_default();
        if text.is_empty() {
          return Err(ValidationError::MissingOtherRelationship);
        }
        if text.chars().count() > MAX_OTHER_LEN {
          return Err(ValidationError::OtherRelationshipTooLong {
            max: MAX_OTHER_LEN,
          });
        }
        Ok(Self::Other(text.to_string()))
      }
      _ => Err(ValidationError::UnknownRelationship(label.to_string())),
    }
  }

  /// The closed-set label, `"other"` for the free-text variant.
  pub fn label(&self) -> &'static str {
    match self {
      Self::Spouse      => "spouse",
      Self::Child       => "child",
      Self::Parent      => "parent",
      Self::Sibling     => "sibling",
      Self::Grandparent => "grandparent",
      Self::Grandchild  => "grandchild",
      Self::Other(_)    => "other",
    }
  }

  /// Human-readable form: the label, or the free text for `Other`.
  pub fn describe(&self) -> &str {
    match self {
      Self::Other(text) => text,
      _                 => self.label(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn closed_labels_parse() {
    assert_eq!(Relationship::parse("Child", None), Ok(Relationship::Child));
    assert_eq!(
      Relationship::parse(" spouse ", None),
      Ok(Relationship::Spouse)
    );
  }

  #[test]
  fn unknown_label_rejected() {
    assert!(matches!(
      Relationship::parse("cousin-german", None),
      Err(ValidationError::UnknownRelationship(_))
    ));
  }

  #[test]
  fn other_requires_text() {
    assert_eq!(
      Relationship::parse("other", None),
      Err(ValidationError::MissingOtherRelationship)
    );
    assert_eq!(
      Relationship::parse("other", Some("  ")),
      Err(ValidationError::MissingOtherRelationship)
    );
    assert_eq!(
      Relationship::parse("other", Some("niece")),
      Ok(Relationship::Other("niece".into()))
    );
  }

  #[test]
  fn other_text_is_bounded() {
    let long = "x".repeat(MAX_OTHER_LEN + 1);
    assert_eq!(
      Relationship::parse("other", Some(&long)),
      Err(ValidationError::OtherRelationshipTooLong { max: MAX_OTHER_LEN })
    );
  }
}
