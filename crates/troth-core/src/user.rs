//! User attributes consumed by the matching pipeline.
//!
//! Users are owned by an external profile service; this core reads them
//! through [`crate::store::UserDirectory`] and never writes them back. The
//! personality trait scores are produced by an external analysis job and
//! arrive here as opaque numbers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Gender and seeking vocabulary ───────────────────────────────────────────

/// Normalized gender vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
  Male,
  Female,
  NonBinary,
  Other,
}

impl Gender {
  /// Parse from the loose vocabulary seen in profile data
  /// ("Men", "woman", "M", "nonbinary", …).
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "male" | "man" | "men" | "m" => Some(Self::Male),
      "female" | "woman" | "women" | "f" => Some(Self::Female),
      "non-binary" | "non_binary" | "nonbinary" | "nb" | "enby" => {
        Some(Self::NonBinary)
      }
      "other" => Some(Self::Other),
      _ => None,
    }
  }
}

/// Who a user is open to being paired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seeking {
  Male,
  Female,
  NonBinary,
  Other,
  Everyone,
}

impl Seeking {
  /// Parse from the loose vocabulary seen in profile data. "Everyone",
  /// "Both", "All", and "Any" collapse to [`Seeking::Everyone`].
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "everyone" | "both" | "all" | "any" | "anyone" => Some(Self::Everyone),
      other => Gender::parse(other).map(|g| match g {
        Gender::Male => Self::Male,
        Gender::Female => Self::Female,
        Gender::NonBinary => Self::NonBinary,
        Gender::Other => Self::Other,
      }),
    }
  }

  /// Whether a seeker with this preference accepts `gender`.
  pub fn accepts(self, gender: Gender) -> bool {
    match (self, gender) {
      (Self::Everyone, _) => true,
      (Self::Male, Gender::Male) => true,
      (Self::Female, Gender::Female) => true,
      (Self::NonBinary, Gender::NonBinary) => true,
      (Self::Other, Gender::Other) => true,
      _ => false,
    }
  }
}

// ─── Relationship goal ───────────────────────────────────────────────────────

/// What a user is looking for. `Both` is compatible with anything; the
/// other two only with themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipGoal {
  Friendship,
  Dating,
  Both,
}

impl RelationshipGoal {
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "friendship" | "friends" | "friend" => Some(Self::Friendship),
      "dating" | "date" | "romance" => Some(Self::Dating),
      "both" | "either" | "open" => Some(Self::Both),
      _ => None,
    }
  }

  pub fn compatible_with(self, other: Self) -> bool {
    self == Self::Both || other == Self::Both || self == other
  }
}

// ─── Scoring strategy ────────────────────────────────────────────────────────

/// The scoring strategy a user has chosen for their own proposals. Exactly
/// one is in effect per user; the default is similarity.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
  #[default]
  Similarity,
  Complementary,
  MultiDimensional,
  DealBreaker,
}

// ─── Personality traits ──────────────────────────────────────────────────────

/// The five named 0–100 trait scores produced by the external personality
/// analysis. Absent until the analysis job has run for the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitScores {
  pub openness:          f64,
  pub conscientiousness: f64,
  pub extraversion:      f64,
  pub agreeableness:     f64,
  pub neuroticism:       f64,
}

impl TraitScores {
  pub fn as_array(&self) -> [f64; 5] {
    [
      self.openness,
      self.conscientiousness,
      self.extraversion,
      self.agreeableness,
      self.neuroticism,
    ]
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A user as seen by the matching pipeline. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:              Uuid,
  pub gender:               Gender,
  pub seeking:              Seeking,
  pub goal:                 RelationshipGoal,
  pub city:                 Option<String>,
  pub age:                  u8,
  pub strategy:             Strategy,
  pub traits:               Option<TraitScores>,
  pub relationship_status:  Option<String>,
  pub attachment_style:     Option<String>,
  pub communication_style:  Option<String>,
  pub deal_breakers:        Vec<String>,
  pub must_haves:           Vec<String>,
  pub is_active:            bool,
  pub is_analysis_complete: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gender_parse_synonyms() {
    assert_eq!(Gender::parse("Men"), Some(Gender::Male));
    assert_eq!(Gender::parse("  WOMAN "), Some(Gender::Female));
    assert_eq!(Gender::parse("non-binary"), Some(Gender::NonBinary));
    assert_eq!(Gender::parse("martian"), None);
  }

  #[test]
  fn seeking_parse_everyone_synonyms() {
    assert_eq!(Seeking::parse("Everyone"), Some(Seeking::Everyone));
    assert_eq!(Seeking::parse("Both"), Some(Seeking::Everyone));
    assert_eq!(Seeking::parse("any"), Some(Seeking::Everyone));
    assert_eq!(Seeking::parse("Men"), Some(Seeking::Male));
  }

  #[test]
  fn seeking_everyone_accepts_all_genders() {
    for g in [Gender::Male, Gender::Female, Gender::NonBinary, Gender::Other]
    {
      assert!(Seeking::Everyone.accepts(g));
    }
    assert!(Seeking::Male.accepts(Gender::Male));
    assert!(!Seeking::Male.accepts(Gender::Female));
  }

  #[test]
  fn goal_both_matches_anything() {
    use RelationshipGoal::*;
    assert!(Both.compatible_with(Friendship));
    assert!(Dating.compatible_with(Both));
    assert!(Dating.compatible_with(Dating));
    assert!(!Dating.compatible_with(Friendship));
  }
}
