//! The `OlympiadStore` trait.
//!
//! Implemented by storage backends (e.g. `olymp-store-sqlite`). The workflow
//! and API layers depend on this abstraction, not on a concrete backend.
//!
//! The two enrollment writes, [`OlympiadStore::create_enrollment`] and
//! [`OlympiadStore::record_decision`], are each a single atomic unit. A
//! backend must serialise them so that checks and writes inside one call
//! never observe a stale view of a concurrent call.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  call::{Call, CallStatus, NewCall},
  catalog::{Area, Category, Competitor, NewCompetitor, RejectionReason, Tutor},
  consensus::ConsensusPolicy,
  enrollment::{
    DecisionInput, DecisionOutcome, Enrollment, EnrollmentView, NewEnrollment,
    TutorAssignment,
  },
  notification::{NewNotification, Notification},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Error type of a store backend.
///
/// Backends raise domain rejections (duplicate, cap, already decided, …)
/// from inside their transactions; generic callers need to tell those apart
/// from infrastructure faults.
pub trait StoreError: std::error::Error + Send + Sync + Sized + 'static {
  /// Return the domain rejection carried by this error, or the error itself
  /// when it is an infrastructure fault.
  fn into_rejection(self) -> Result<crate::Error, Self>;
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an olympiad registration store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait OlympiadStore: Send + Sync {
  type Error: StoreError;

  // ── Catalog: writes ───────────────────────────────────────────────────

  fn add_area(
    &self,
    name: String,
    fee_cents: i64,
  ) -> impl Future<Output = Result<Area, Self::Error>> + Send + '_;

  fn add_category(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  fn add_tutor(
    &self,
    user_id: Uuid,
    full_name: String,
  ) -> impl Future<Output = Result<Tutor, Self::Error>> + Send + '_;

  fn add_competitor(
    &self,
    input: NewCompetitor,
  ) -> impl Future<Output = Result<Competitor, Self::Error>> + Send + '_;

  /// Persist a call after validating its schedule.
  fn add_call(
    &self,
    input: NewCall,
  ) -> impl Future<Output = Result<Call, Self::Error>> + Send + '_;

  fn set_call_status(
    &self,
    call_id: Uuid,
    status: CallStatus,
  ) -> impl Future<Output = Result<Call, Self::Error>> + Send + '_;

  /// Offer `area_id` in `call_id`. Offering an already-offered area is a
  /// no-op; offering an area already offered by a call with an overlapping
  /// registration window fails.
  fn offer_area(
    &self,
    call_id: Uuid,
    area_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Catalog: reads ────────────────────────────────────────────────────

  fn get_competitor(
    &self,
    competitor_id: Uuid,
  ) -> impl Future<Output = Result<Option<Competitor>, Self::Error>> + Send + '_;

  fn competitor_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Competitor>, Self::Error>> + Send + '_;

  fn tutor_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Tutor>, Self::Error>> + Send + '_;

  /// The tutors among `tutor_ids` that exist; unknown ids are skipped.
  fn tutors_by_ids(
    &self,
    tutor_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Tutor>, Self::Error>> + Send + '_;

  /// Calls offering `area_id` that accept registrations at `at`, ordered by
  /// registration start then call id.
  fn open_calls_for_area(
    &self,
    area_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Call>, Self::Error>> + Send + '_;

  fn areas_for_call(
    &self,
    call_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Area>, Self::Error>> + Send + '_;

  fn list_rejection_reasons(
    &self,
  ) -> impl Future<Output = Result<Vec<RejectionReason>, Self::Error>> + Send + '_;

  // ── Enrollments ───────────────────────────────────────────────────────

  /// Atomically check for a duplicate `(competitor, call, area)`, enforce
  /// the area cap, and insert the enrollment with one undecided link per
  /// tutor. Nothing is written when any step fails.
  fn create_enrollment(
    &self,
    input: NewEnrollment,
  ) -> impl Future<Output = Result<EnrollmentView, Self::Error>> + Send + '_;

  /// Atomically decide one link, re-read every link of the enrollment,
  /// evaluate `policy`, and write the resulting status transition. An
  /// unknown enrollment is `EnrollmentNotFound`; a known one without a link
  /// for `tutor_id` is `NoSuchLink`.
  fn record_decision(
    &self,
    input: DecisionInput,
    policy: ConsensusPolicy,
  ) -> impl Future<Output = Result<DecisionOutcome, Self::Error>> + Send + '_;

  fn get_enrollment(
    &self,
    enrollment_id: Uuid,
  ) -> impl Future<Output = Result<Option<EnrollmentView>, Self::Error>> + Send + '_;

  /// All enrollments of a competitor with their links, newest first.
  fn enrollments_for_competitor(
    &self,
    competitor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<EnrollmentView>, Self::Error>> + Send + '_;

  /// Enrollments on which `tutor_id` has not decided yet, oldest first.
  fn pending_for_tutor(
    &self,
    tutor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Enrollment>, Self::Error>> + Send + '_;

  /// Every enrollment `tutor_id` is assigned to, with that tutor's link.
  fn assignments_for_tutor(
    &self,
    tutor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<TutorAssignment>, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  fn add_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Notifications addressed to `user_id`, newest first.
  fn notifications_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;
}
