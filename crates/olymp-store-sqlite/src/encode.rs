//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order matches chronological order.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use olymp_core::{
  call::{Call, CallSchedule, CallStatus},
  catalog::{Area, Competitor, Tutor},
  enrollment::{DecisionState, Enrollment, EnrollmentStatus, TutorDecision},
  notification::{Notification, NotificationKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

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

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_enrollment_status(s: &str) -> Result<EnrollmentStatus> {
  s.parse().map_err(|_| Error::Decode {
    column: "enrollments.status",
    value:  s.to_owned(),
  })
}

pub fn decode_decision(s: &str) -> Result<DecisionState> {
  s.parse().map_err(|_| Error::Decode {
    column: "tutor_decisions.decision",
    value:  s.to_owned(),
  })
}

pub fn decode_notification_kind(s: &str) -> Result<NotificationKind> {
  s.parse().map_err(|_| Error::Decode {
    column: "notifications.kind",
    value:  s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const CALL_COLUMNS: &str = "c.call_id, c.name, c.description, c.status_code,
   c.registration_start, c.registration_end, c.payment_start, c.payment_end,
   c.competition_start, c.competition_end";

/// Raw values read directly from a `calls` row.
pub struct RawCall {
  pub call_id:            String,
  pub name:               String,
  pub description:        String,
  pub status_code:        i64,
  pub registration_start: String,
  pub registration_end:   String,
  pub payment_start:      String,
  pub payment_end:        String,
  pub competition_start:  String,
  pub competition_end:    String,
}

impl RawCall {
  /// Map a row selected with [`CALL_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawCall {
      call_id:            row.get(0)?,
      name:               row.get(1)?,
      description:        row.get(2)?,
      status_code:        row.get(3)?,
      registration_start: row.get(4)?,
      registration_end:   row.get(5)?,
      payment_start:      row.get(6)?,
      payment_end:        row.get(7)?,
      competition_start:  row.get(8)?,
      competition_end:    row.get(9)?,
    })
  }

  pub fn into_call(self) -> Result<Call> {
    Ok(Call {
      call_id:     decode_uuid(&self.call_id)?,
      name:        self.name,
      description: self.description,
      status:      CallStatus::from_code(self.status_code)?,
      schedule:    CallSchedule {
        registration_start: decode_dt(&self.registration_start)?,
        registration_end:   decode_dt(&self.registration_end)?,
        payment_start:      decode_dt(&self.payment_start)?,
        payment_end:        decode_dt(&self.payment_end)?,
        competition_start:  decode_dt(&self.competition_start)?,
        competition_end:    decode_dt(&self.competition_end)?,
      },
    })
  }
}

pub const ENROLLMENT_COLUMNS: &str = "e.enrollment_id, e.competitor_id,
   e.area_id, e.call_id, e.category_id, e.created_at, e.status,
   e.status_changed_at";

/// Raw strings read directly from an `enrollments` row.
pub struct RawEnrollment {
  pub enrollment_id:     String,
  pub competitor_id:     String,
  pub area_id:           String,
  pub call_id:           String,
  pub category_id:       String,
  pub created_at:        String,
  pub status:            String,
  pub status_changed_at: Option<String>,
}

impl RawEnrollment {
  /// Map a row selected with [`ENROLLMENT_COLUMNS`], starting at `offset`.
  pub fn from_row(
    row: &rusqlite::Row<'_>,
    offset: usize,
  ) -> rusqlite::Result<Self> {
    Ok(RawEnrollment {
      enrollment_id:     row.get(offset)?,
      competitor_id:     row.get(offset + 1)?,
      area_id:           row.get(offset + 2)?,
      call_id:           row.get(offset + 3)?,
      category_id:       row.get(offset + 4)?,
      created_at:        row.get(offset + 5)?,
      status:            row.get(offset + 6)?,
      status_changed_at: row.get(offset + 7)?,
    })
  }

  pub fn into_enrollment(self) -> Result<Enrollment> {
    Ok(Enrollment {
      enrollment_id:     decode_uuid(&self.enrollment_id)?,
      competitor_id:     decode_uuid(&self.competitor_id)?,
      area_id:           decode_uuid(&self.area_id)?,
      call_id:           decode_uuid(&self.call_id)?,
      category_id:       decode_uuid(&self.category_id)?,
      created_at:        decode_dt(&self.created_at)?,
      status:            decode_enrollment_status(&self.status)?,
      status_changed_at: self
        .status_changed_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    })
  }
}

pub const DECISION_COLUMNS: &str = "d.link_id, d.enrollment_id, d.tutor_id,
   d.decision, d.decided_at, d.reason_id, d.elaboration";

/// Raw values read directly from a `tutor_decisions` row.
pub struct RawDecision {
  pub link_id:       String,
  pub enrollment_id: String,
  pub tutor_id:      String,
  pub decision:      String,
  pub decided_at:    Option<String>,
  pub reason_id:     Option<i64>,
  pub elaboration:   Option<String>,
}

impl RawDecision {
  /// Map a row selected with [`DECISION_COLUMNS`], starting at `offset`.
  pub fn from_row(
    row: &rusqlite::Row<'_>,
    offset: usize,
  ) -> rusqlite::Result<Self> {
    Ok(RawDecision {
      link_id:       row.get(offset)?,
      enrollment_id: row.get(offset + 1)?,
      tutor_id:      row.get(offset + 2)?,
      decision:      row.get(offset + 3)?,
      decided_at:    row.get(offset + 4)?,
      reason_id:     row.get(offset + 5)?,
      elaboration:   row.get(offset + 6)?,
    })
  }

  pub fn into_decision(self) -> Result<TutorDecision> {
    Ok(TutorDecision {
      link_id:       decode_uuid(&self.link_id)?,
      enrollment_id: decode_uuid(&self.enrollment_id)?,
      tutor_id:      decode_uuid(&self.tutor_id)?,
      decision:      decode_decision(&self.decision)?,
      decided_at:    self.decided_at.as_deref().map(decode_dt).transpose()?,
      reason_id:     self.reason_id,
      elaboration:   self.elaboration,
    })
  }
}

/// Raw values read directly from an `areas` row.
pub struct RawArea {
  pub area_id:   String,
  pub name:      String,
  pub fee_cents: i64,
}

impl RawArea {
  pub fn into_area(self) -> Result<Area> {
    Ok(Area {
      area_id:   decode_uuid(&self.area_id)?,
      name:      self.name,
      fee_cents: self.fee_cents,
    })
  }
}

/// Raw strings read directly from a `tutors` row.
pub struct RawTutor {
  pub tutor_id:  String,
  pub user_id:   String,
  pub full_name: String,
}

impl RawTutor {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawTutor {
      tutor_id:  row.get(0)?,
      user_id:   row.get(1)?,
      full_name: row.get(2)?,
    })
  }

  pub fn into_tutor(self) -> Result<Tutor> {
    Ok(Tutor {
      tutor_id:  decode_uuid(&self.tutor_id)?,
      user_id:   decode_uuid(&self.user_id)?,
      full_name: self.full_name,
    })
  }
}

/// Raw strings read directly from a `competitors` row.
pub struct RawCompetitor {
  pub competitor_id: String,
  pub user_id:       String,
  pub full_name:     String,
  pub birth_date:    String,
  pub school:        Option<String>,
}

impl RawCompetitor {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawCompetitor {
      competitor_id: row.get(0)?,
      user_id:       row.get(1)?,
      full_name:     row.get(2)?,
      birth_date:    row.get(3)?,
      school:        row.get(4)?,
    })
  }

  pub fn into_competitor(self) -> Result<Competitor> {
    Ok(Competitor {
      competitor_id: decode_uuid(&self.competitor_id)?,
      user_id:       decode_uuid(&self.user_id)?,
      full_name:     self.full_name,
      birth_date:    decode_date(&self.birth_date)?,
      school:        self.school,
    })
  }
}

/// Raw strings read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub user_id:         String,
  pub kind:            String,
  pub message:         String,
  pub created_at:      String,
}

impl RawNotification {
  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      user_id:         decode_uuid(&self.user_id)?,
      kind:            decode_notification_kind(&self.kind)?,
      message:         self.message,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
