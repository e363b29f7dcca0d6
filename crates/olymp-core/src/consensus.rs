//! Tutor consensus: pure rules mapping a set of decisions to a verdict.

use serde::{Deserialize, Serialize};

use crate::enrollment::{DecisionState, EnrollmentStatus};

pub fn all_approved(decisions: &[DecisionState]) -> bool {
  decisions.iter().all(|d| *d == DecisionState::Approved)
}

pub fn all_responded(decisions: &[DecisionState]) -> bool {
  decisions.iter().all(|d| *d != DecisionState::Undecided)
}

pub fn all_rejected(decisions: &[DecisionState]) -> bool {
  decisions.iter().all(|d| *d == DecisionState::Rejected)
}

/// How a fully-responded set with both approvals and rejections resolves.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusPolicy {
  /// Accept on unanimous approval, reject on unanimous rejection. A mixed
  /// set is reported as [`Verdict::Split`] and leaves the enrollment
  /// pending.
  #[default]
  Unanimous,
  /// Wait for every tutor, then accept only on unanimous approval and reject
  /// otherwise.
  AnyRejection,
}

/// Aggregate reading of a decision set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  /// At least one tutor has not responded and no terminal rule applies.
  Awaiting,
  Accept,
  Reject,
  /// Everyone responded, with both approvals and rejections, and the policy
  /// does not resolve it.
  Split,
}

impl Verdict {
  /// The status an enrollment should move to, if any.
  pub fn target_status(self) -> Option<EnrollmentStatus> {
    match self {
      Verdict::Accept => Some(EnrollmentStatus::Accepted),
      Verdict::Reject => Some(EnrollmentStatus::Rejected),
      Verdict::Awaiting | Verdict::Split => None,
    }
  }
}

impl ConsensusPolicy {
  pub fn evaluate(self, decisions: &[DecisionState]) -> Verdict {
    if decisions.is_empty() {
      return Verdict::Awaiting;
    }
    if all_approved(decisions) {
      return Verdict::Accept;
    }
    if !all_responded(decisions) {
      return Verdict::Awaiting;
    }
    if all_rejected(decisions) {
      return Verdict::Reject;
    }
    match self {
      ConsensusPolicy::Unanimous => Verdict::Split,
      ConsensusPolicy::AnyRejection => Verdict::Reject,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::enrollment::DecisionState::{
    Approved as A, Rejected as R, Undecided as U,
  };

  #[test]
  fn partial_approval_is_not_enough() {
    assert_eq!(ConsensusPolicy::Unanimous.evaluate(&[A, U]), Verdict::Awaiting);
    assert_eq!(
      ConsensusPolicy::AnyRejection.evaluate(&[A, A, U]),
      Verdict::Awaiting
    );
  }

  #[test]
  fn unanimous_approval_accepts() {
    for policy in [ConsensusPolicy::Unanimous, ConsensusPolicy::AnyRejection] {
      assert_eq!(policy.evaluate(&[A]), Verdict::Accept);
      assert_eq!(policy.evaluate(&[A, A, A]), Verdict::Accept);
    }
  }

  #[test]
  fn rejection_waits_for_everyone() {
    for policy in [ConsensusPolicy::Unanimous, ConsensusPolicy::AnyRejection] {
      assert_eq!(policy.evaluate(&[R, U]), Verdict::Awaiting);
      assert_eq!(policy.evaluate(&[R, R]), Verdict::Reject);
    }
  }

  #[test]
  fn mixed_set_depends_on_policy() {
    assert_eq!(ConsensusPolicy::Unanimous.evaluate(&[A, R]), Verdict::Split);
    assert_eq!(
      ConsensusPolicy::AnyRejection.evaluate(&[R, A, A]),
      Verdict::Reject
    );
  }

  #[test]
  fn predicates() {
    assert!(all_responded(&[A, R]));
    assert!(!all_responded(&[A, U]));
    assert!(all_rejected(&[R, R]));
    assert!(!all_rejected(&[R, A]));
    assert!(!all_approved(&[A, U]));
  }

  #[test]
  fn target_status() {
    assert_eq!(Verdict::Accept.target_status(), Some(EnrollmentStatus::Accepted));
    assert_eq!(Verdict::Reject.target_status(), Some(EnrollmentStatus::Rejected));
    assert_eq!(Verdict::Split.target_status(), None);
  }
}
