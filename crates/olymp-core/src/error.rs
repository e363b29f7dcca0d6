//! Error types for `olymp-core`.
//!
//! Every variant is a client-input or state error that a caller can act on.
//! Infrastructure faults live in the store crates and never appear here.

use strum::IntoStaticStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Error {
  // ── Enrollment workflow ────────────────────────────────────────────────

  #[error("no open call accepts registrations for area {0}")]
  NoOpenCall(Uuid),

  #[error(
    "competitor {competitor_id} already holds {existing} enrollments in call \
     {call_id} (limit {limit})"
  )]
  AreaCapExceeded {
    competitor_id: Uuid,
    call_id:       Uuid,
    existing:      usize,
    limit:         usize,
  },

  #[error(
    "competitor {competitor_id} is already enrolled in area {area_id} for call \
     {call_id}"
  )]
  DuplicateEnrollment {
    competitor_id: Uuid,
    call_id:       Uuid,
    area_id:       Uuid,
  },

  #[error("invalid tutor set: {0}")]
  InvalidTutorSet(String),

  #[error("tutor {tutor_id} is not assigned to enrollment {enrollment_id}")]
  NoSuchLink { enrollment_id: Uuid, tutor_id: Uuid },

  #[error("tutor {tutor_id} already decided on enrollment {enrollment_id}")]
  AlreadyDecided { enrollment_id: Uuid, tutor_id: Uuid },

  #[error("a rejection requires a reason")]
  MissingReason,

  #[error("unknown rejection reason: {0}")]
  UnknownReason(i64),

  // ── Catalog ────────────────────────────────────────────────────────────

  #[error("invalid call schedule: {0}")]
  InvalidSchedule(String),

  #[error("unknown call status code: {0}")]
  UnknownCallStatus(i64),

  #[error("area {area_id} is already offered by overlapping call {other_call_id}")]
  AreaAlreadyOffered { area_id: Uuid, other_call_id: Uuid },

  #[error("competitor not found: {0}")]
  CompetitorNotFound(Uuid),

  #[error("tutor not found: {0}")]
  TutorNotFound(Uuid),

  #[error("enrollment not found: {0}")]
  EnrollmentNotFound(Uuid),

  #[error("call not found: {0}")]
  CallNotFound(Uuid),

  #[error("area not found: {0}")]
  AreaNotFound(Uuid),

  #[error("category not found: {0}")]
  CategoryNotFound(Uuid),
}

impl Error {
  /// Stable snake_case identifier of the variant, e.g. `area_cap_exceeded`.
  pub fn code(&self) -> &'static str { self.into() }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
