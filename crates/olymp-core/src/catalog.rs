//! Catalog entities read by the enrollment workflow.
//!
//! Areas, categories, tutors and competitors are maintained elsewhere; the
//! workflow only reads them. The constructors here exist so that a store can
//! be seeded.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rejection reason code whose free-text elaboration is persisted.
pub const OTHER_REASON_ID: i64 = 7;

/// A competition subject with a registration fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
  pub area_id:   Uuid,
  pub name:      String,
  /// Fee in the smallest currency unit.
  pub fee_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub category_id: Uuid,
  pub name:        String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tutor {
  pub tutor_id:  Uuid,
  /// The user account notified on the tutor's behalf.
  pub user_id:   Uuid,
  pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
  pub competitor_id: Uuid,
  pub user_id:       Uuid,
  pub full_name:     String,
  pub birth_date:    NaiveDate,
  pub school:        Option<String>,
}

/// Input to [`crate::store::OlympiadStore::add_competitor`].
#[derive(Debug, Clone)]
pub struct NewCompetitor {
  pub user_id:    Uuid,
  pub full_name:  String,
  pub birth_date: NaiveDate,
  pub school:     Option<String>,
}

/// A catalogued reason a tutor may give when rejecting an enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionReason {
  pub reason_id: i64,
  pub label:     String,
}
