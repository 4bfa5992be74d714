//! Candidate pre-filtering: who may even be scored against whom.
//!
//! Applied before any scoring. The historical exclusion is what guarantees
//! that at most one record ever exists per pair — a previously matched
//! couple is never proposed again, whatever became of the record.

use std::collections::HashSet;

use uuid::Uuid;

use crate::{record::MatchRecord, user::User};

/// Both directions must hold independently: each side's preference is
/// `everyone` or names the other's gender.
pub fn mutually_seeking(a: &User, b: &User) -> bool {
  a.seeking.accepts(b.gender) && b.seeking.accepts(a.gender)
}

/// Seeking and relationship-goal compatibility together.
pub fn compatible(a: &User, b: &User) -> bool {
  mutually_seeking(a, b) && a.goal.compatible_with(b.goal)
}

/// Filter `pool` down to scorable candidates for `user`.
///
/// Excludes, in order: the user themselves; anyone appearing on either side
/// of any record in `history` (any status, any lifetime); anyone failing
/// mutual seeking or goal compatibility.
pub fn filter_candidates<'a>(
  user:    &User,
  pool:    &'a [User],
  history: &[MatchRecord],
) -> Vec<&'a User> {
  let paired: HashSet<Uuid> = history
    .iter()
    .flat_map(|r| [r.user1_id, r.user2_id])
    .collect();

  pool
    .iter()
    .filter(|c| c.user_id != user.user_id)
    .filter(|c| !paired.contains(&c.user_id))
    .filter(|c| compatible(user, c))
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::user::{Gender, RelationshipGoal, Seeking, Strategy};

  fn user(gender: Gender, seeking: Seeking) -> User {
    User {
      user_id: Uuid::new_v4(),
      gender,
      seeking,
      goal: RelationshipGoal::Dating,
      city: None,
      age: 30,
      strategy: Strategy::Similarity,
      traits: None,
      relationship_status: None,
      attachment_style: None,
      communication_style: None,
      deal_breakers: vec![],
      must_haves: vec![],
      is_active: true,
      is_analysis_complete: true,
    }
  }

  #[test]
  fn mutual_seeking_requires_both_directions() {
    let a = user(Gender::Male, Seeking::Female);
    let b = user(Gender::Female, Seeking::Male);
    let c = user(Gender::Female, Seeking::Female);

    assert!(mutually_seeking(&a, &b));
    // c does not accept a's gender, even though a accepts c's.
    assert!(!mutually_seeking(&a, &c));
  }

  #[test]
  fn everyone_accepts_any_gender_but_still_needs_the_reverse() {
    let a = user(Gender::NonBinary, Seeking::Everyone);
    let b = user(Gender::Female, Seeking::Male);

    assert!(!mutually_seeking(&a, &b));
  }

  #[test]
  fn goal_mismatch_excludes() {
    let mut a = user(Gender::Male, Seeking::Everyone);
    let mut b = user(Gender::Female, Seeking::Everyone);
    a.goal = RelationshipGoal::Friendship;
    b.goal = RelationshipGoal::Dating;
    assert!(!compatible(&a, &b));

    b.goal = RelationshipGoal::Both;
    assert!(compatible(&a, &b));
  }

  #[test]
  fn filter_excludes_self_and_history() {
    let me = user(Gender::Male, Seeking::Everyone);
    let seen = user(Gender::Female, Seeking::Everyone);
    let fresh = user(Gender::Female, Seeking::Everyone);
    let pool = vec![me.clone(), seen.clone(), fresh.clone()];

    // A rejected record still excludes the pair forever.
    let mut old = MatchRecord::new_one_way(
      Uuid::new_v4(),
      me.user_id,
      seen.user_id,
      40,
      Strategy::Similarity,
      "old".into(),
      Utc::now(),
    );
    old.remove(crate::record::DeletedReason::NoInterest, Utc::now());

    let out = filter_candidates(&me, &pool, &[old]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].user_id, fresh.user_id);
  }

  #[test]
  fn incompatible_seekers_never_become_candidates() {
    let a = user(Gender::Male, Seeking::Male);
    let b = user(Gender::Female, Seeking::Male);
    let pool = vec![a.clone(), b.clone()];

    assert!(filter_candidates(&a, &pool, &[]).is_empty());
    assert!(filter_candidates(&b, &pool, &[]).is_empty());
  }
}
