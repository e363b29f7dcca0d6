//! Enrollments and tutor decision links.
//!
//! An enrollment registers one competitor in one area of one call. It owns
//! one to three tutor decision links, created together with it and each
//! mutated exactly once by its tutor.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use crate::{Error, Result, catalog::OTHER_REASON_ID, consensus::Verdict};

/// Minimum and maximum number of tutors assigned to one enrollment.
pub const MIN_TUTORS: usize = 1;
pub const MAX_TUTORS: usize = 3;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Overall status of an enrollment. `Accepted` and `Rejected` are terminal.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EnrollmentStatus {
  #[default]
  Pending,
  Accepted,
  Rejected,
}

impl EnrollmentStatus {
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Pending) }
}

/// One tutor's decision on an enrollment.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DecisionState {
  #[default]
  Undecided,
  Approved,
  Rejected,
}

// ─── Entities ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
  pub enrollment_id:     Uuid,
  pub competitor_id:     Uuid,
  pub area_id:           Uuid,
  pub call_id:           Uuid,
  pub category_id:       Uuid,
  pub created_at:        DateTime<Utc>,
  pub status:            EnrollmentStatus,
  /// When the enrollment left `Pending`; `None` while pending.
  pub status_changed_at: Option<DateTime<Utc>>,
}

/// The link between one tutor and one enrollment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorDecision {
  pub link_id:       Uuid,
  pub enrollment_id: Uuid,
  pub tutor_id:      Uuid,
  pub decision:      DecisionState,
  /// `None` while undecided.
  pub decided_at:    Option<DateTime<Utc>>,
  /// Present only when `decision` is `Rejected`.
  pub reason_id:     Option<i64>,
  /// Present only when `reason_id` is [`OTHER_REASON_ID`].
  pub elaboration:   Option<String>,
}

impl TutorDecision {
  /// A fresh, undecided link.
  pub fn undecided(enrollment_id: Uuid, tutor_id: Uuid) -> Self {
    Self {
      link_id: Uuid::new_v4(),
      enrollment_id,
      tutor_id,
      decision: DecisionState::Undecided,
      decided_at: None,
      reason_id: None,
      elaboration: None,
    }
  }
}

/// An enrollment bundled with all of its decision links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentView {
  pub enrollment: Enrollment,
  pub decisions:  Vec<TutorDecision>,
}

/// An enrollment seen from one assigned tutor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorAssignment {
  pub enrollment: Enrollment,
  pub decision:   TutorDecision,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::OlympiadStore::create_enrollment`].
///
/// The call has already been resolved; the store enforces uniqueness and the
/// area cap inside the same atomic unit as the inserts.
#[derive(Debug, Clone)]
pub struct NewEnrollment {
  pub competitor_id: Uuid,
  pub area_id:       Uuid,
  pub call_id:       Uuid,
  pub category_id:   Uuid,
  pub tutor_ids:     Vec<Uuid>,
}

/// Check the size and distinctness of a requested tutor set.
pub fn validate_tutor_set(tutor_ids: &[Uuid]) -> Result<()> {
  if !(MIN_TUTORS..=MAX_TUTORS).contains(&tutor_ids.len()) {
    return Err(Error::InvalidTutorSet(format!(
      "between {MIN_TUTORS} and {MAX_TUTORS} tutors are required, got {}",
      tutor_ids.len()
    )));
  }

  let distinct: HashSet<&Uuid> = tutor_ids.iter().collect();
  if distinct.len() != tutor_ids.len() {
    return Err(Error::InvalidTutorSet(
      "the same tutor was selected more than once".to_owned(),
    ));
  }

  Ok(())
}

/// A tutor's vote as submitted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "vote", rename_all = "snake_case")]
pub enum Vote {
  Approve,
  Reject {
    reason_id:   Option<i64>,
    elaboration: Option<String>,
  },
}

/// The fields written to a decision link once a vote is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVote {
  pub decision:    DecisionState,
  pub reason_id:   Option<i64>,
  pub elaboration: Option<String>,
}

impl Vote {
  /// Normalise the vote: a rejection needs a reason, and the elaboration
  /// survives only for the "other" reason code.
  pub fn resolve(self) -> Result<ResolvedVote> {
    match self {
      Vote::Approve => Ok(ResolvedVote {
        decision:    DecisionState::Approved,
        reason_id:   None,
        elaboration: None,
      }),
      Vote::Reject { reason_id, elaboration } => {
        let reason_id = reason_id.ok_or(Error::MissingReason)?;
        let elaboration =
          elaboration.filter(|_| reason_id == OTHER_REASON_ID);
        Ok(ResolvedVote {
          decision: DecisionState::Rejected,
          reason_id: Some(reason_id),
          elaboration,
        })
      }
    }
  }
}

/// Input to [`crate::store::OlympiadStore::record_decision`].
#[derive(Debug, Clone)]
pub struct DecisionInput {
  pub enrollment_id: Uuid,
  pub tutor_id:      Uuid,
  pub vote:          Vote,
}

/// Result of recording one tutor decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionOutcome {
  /// The enrollment after the decision committed.
  pub enrollment:   Enrollment,
  /// The link that was just decided.
  pub decision:     TutorDecision,
  /// Consensus over all links, evaluated against the committed set.
  pub verdict:      Verdict,
  /// Whether this decision moved the enrollment out of `Pending`.
  pub transitioned: bool,
}
