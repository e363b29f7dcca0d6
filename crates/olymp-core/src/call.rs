//! Calls (convocatorias): time-boxed competition cycles.
//!
//! A call moves through registration, payment and competition phases. Only
//! the registration window matters to the enrollment workflow; the other
//! phases are validated on creation so that the catalog never holds an
//! incoherent schedule.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status of a call.
///
/// The catalog stores these as numeric codes; see [`CallStatus::code`] for
/// the mapping. Downstream filters branch on [`CallStatus::Open`], which is
/// code `2`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
  #[default]
  Draft,
  Open,
  InPayment,
  InCompetition,
  Closed,
}

/// Numeric code ↔ status mapping table.
const STATUS_CODES: [(i64, CallStatus); 5] = [
  (1, CallStatus::Draft),
  (2, CallStatus::Open),
  (3, CallStatus::InPayment),
  (4, CallStatus::InCompetition),
  (5, CallStatus::Closed),
];

impl CallStatus {
  /// The numeric code stored in the catalog.
  pub fn code(self) -> i64 {
    STATUS_CODES
      .iter()
      .find(|(_, status)| *status == self)
      .map(|(code, _)| *code)
      .unwrap_or_default()
  }

  pub fn from_code(code: i64) -> Result<Self> {
    STATUS_CODES
      .iter()
      .find(|(c, _)| *c == code)
      .map(|(_, status)| *status)
      .ok_or(Error::UnknownCallStatus(code))
  }
}

// ─── Schedule ────────────────────────────────────────────────────────────────

/// The three phase windows of a call. All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSchedule {
  pub registration_start: DateTime<Utc>,
  pub registration_end:   DateTime<Utc>,
  pub payment_start:      DateTime<Utc>,
  pub payment_end:        DateTime<Utc>,
  pub competition_start:  DateTime<Utc>,
  pub competition_end:    DateTime<Utc>,
}

impl CallSchedule {
  /// Check the phase ordering; returns the first violated rule.
  pub fn validate(&self) -> Result<()> {
    let rules: [(bool, &str); 5] = [
      (
        self.registration_start < self.registration_end,
        "registration must start before it ends",
      ),
      (
        self.payment_start >= self.registration_start,
        "payment cannot start before registration",
      ),
      (
        self.payment_end > self.payment_start,
        "payment must start before it ends",
      ),
      (
        self.competition_start > self.payment_end,
        "competition must start after payment ends",
      ),
      (
        self.competition_end > self.competition_start,
        "competition must start before it ends",
      ),
    ];

    match rules.iter().find(|(ok, _)| !ok) {
      Some((_, message)) => Err(Error::InvalidSchedule((*message).to_owned())),
      None => Ok(()),
    }
  }

  pub fn registration_contains(&self, at: DateTime<Utc>) -> bool {
    self.registration_start <= at && at <= self.registration_end
  }

  /// Whether two registration windows share at least one instant.
  pub fn registration_overlaps(&self, other: &CallSchedule) -> bool {
    self.registration_start <= other.registration_end
      && other.registration_start <= self.registration_end
  }
}

// ─── Call ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
  pub call_id:     Uuid,
  pub name:        String,
  pub description: String,
  pub status:      CallStatus,
  pub schedule:    CallSchedule,
}

impl Call {
  /// True when the call is `Open` and `at` falls inside its registration
  /// window.
  pub fn accepts_registrations_at(&self, at: DateTime<Utc>) -> bool {
    self.status == CallStatus::Open && self.schedule.registration_contains(at)
  }
}

/// Input to [`crate::store::OlympiadStore::add_call`].
#[derive(Debug, Clone)]
pub struct NewCall {
  pub name:        String,
  pub description: String,
  pub status:      CallStatus,
  pub schedule:    CallSchedule,
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  fn schedule(origin: DateTime<Utc>) -> CallSchedule {
    CallSchedule {
      registration_start: origin,
      registration_end:   origin + Duration::days(10),
      payment_start:      origin + Duration::days(5),
      payment_end:        origin + Duration::days(15),
      competition_start:  origin + Duration::days(20),
      competition_end:    origin + Duration::days(21),
    }
  }

  #[test]
  fn status_codes_map_both_ways() {
    for code in 1..=5 {
      assert_eq!(CallStatus::from_code(code).unwrap().code(), code);
    }
    assert_eq!(CallStatus::Open.code(), 2);
    assert_eq!(CallStatus::from_code(9), Err(Error::UnknownCallStatus(9)));
  }

  #[test]
  fn coherent_schedule_validates() {
    assert!(schedule(Utc::now()).validate().is_ok());
  }

  #[test]
  fn payment_before_registration_is_rejected() {
    let mut s = schedule(Utc::now());
    s.payment_start = s.registration_start - Duration::days(1);
    assert!(matches!(s.validate(), Err(Error::InvalidSchedule(_))));
  }

  #[test]
  fn competition_overlapping_payment_is_rejected() {
    let mut s = schedule(Utc::now());
    s.competition_start = s.payment_end;
    assert!(matches!(s.validate(), Err(Error::InvalidSchedule(m)) if m.contains("competition")));
  }

  #[test]
  fn registration_window_is_inclusive() {
    let now = Utc::now();
    let call = Call {
      call_id:     Uuid::new_v4(),
      name:        "Olympiad".into(),
      description: String::new(),
      status:      CallStatus::Open,
      schedule:    schedule(now),
    };
    assert!(call.accepts_registrations_at(now));
    assert!(call.accepts_registrations_at(now + Duration::days(10)));
    assert!(!call.accepts_registrations_at(now + Duration::days(11)));

    let draft = Call { status: CallStatus::Draft, ..call };
    assert!(!draft.accepts_registrations_at(now));
  }

  #[test]
  fn overlapping_windows() {
    let now = Utc::now();
    let a = schedule(now);
    let b = schedule(now + Duration::days(10));
    let c = schedule(now + Duration::days(11));
    assert!(a.registration_overlaps(&b));
    assert!(!a.registration_overlaps(&c));
  }
}
