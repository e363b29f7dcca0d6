//! The enrollment lifecycle: `Pending → {Accepted, Rejected}`.
//!
//! [`EnrollmentWorkflow`] validates requests, delegates the atomic units to
//! the store, and notifies the affected users once a unit has committed.
//! Notification failures never fail the operation that triggered them.

use std::sync::Arc;

use chrono::Utc;
use olymp_core::{
  call::Call,
  cap::has_room,
  catalog::{Area, Competitor, RejectionReason, Tutor},
  consensus::{ConsensusPolicy, Verdict},
  enrollment::{
    DecisionInput, DecisionOutcome, Enrollment, EnrollmentView, NewEnrollment,
    TutorAssignment, Vote, validate_tutor_set,
  },
  notification::{Notification, NotificationKind},
  store::OlympiadStore,
};
use uuid::Uuid;

use crate::{
  Error, Result, channel::PushChannel, dispatcher::Dispatcher,
  resolver::resolve_open_call,
};

pub const REQUEST_MESSAGE: &str =
  "A competitor asked you to approve a new enrollment.";
pub const APPROVED_MESSAGE: &str = "Enrollment approved.";
pub const REJECTED_MESSAGE: &str = "Enrollment rejected. See the assigned reason.";
pub const SPLIT_MESSAGE: &str =
  "Your tutors disagree on this enrollment; it remains pending.";

pub struct EnrollmentWorkflow<S> {
  store:      Arc<S>,
  dispatcher: Dispatcher<S>,
  policy:     ConsensusPolicy,
}

impl<S> Clone for EnrollmentWorkflow<S> {
  fn clone(&self) -> Self {
    Self {
      store:      self.store.clone(),
      dispatcher: self.dispatcher.clone(),
      policy:     self.policy,
    }
  }
}

impl<S: OlympiadStore> EnrollmentWorkflow<S> {
  pub fn new(
    store: Arc<S>,
    channels: Arc<dyn PushChannel>,
    policy: ConsensusPolicy,
  ) -> Self {
    let dispatcher = Dispatcher::new(store.clone(), channels);
    Self { store, dispatcher, policy }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn policy(&self) -> ConsensusPolicy { self.policy }

  // ── Identity ──────────────────────────────────────────────────────────────

  /// The competitor profile owned by user `user_id`.
  pub async fn competitor_for_user(&self, user_id: Uuid) -> Result<Competitor> {
    self
      .store
      .competitor_for_user(user_id)
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::Rejected(olymp_core::Error::CompetitorNotFound(user_id)))
  }

  /// The tutor profile owned by user `user_id`.
  pub async fn tutor_for_user(&self, user_id: Uuid) -> Result<Tutor> {
    self
      .store
      .tutor_for_user(user_id)
      .await
      .map_err(Error::from_store)?
      .ok_or(Error::Rejected(olymp_core::Error::TutorNotFound(user_id)))
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Enroll a competitor in the call currently open for `area_id`, assigning
  /// one to three tutors, and ask each tutor for a decision.
  pub async fn create_enrollment(
    &self,
    competitor_id: Uuid,
    area_id: Uuid,
    category_id: Uuid,
    tutor_ids: Vec<Uuid>,
  ) -> Result<EnrollmentView> {
    validate_tutor_set(&tutor_ids)?;

    let tutors = self
      .store
      .tutors_by_ids(tutor_ids.clone())
      .await
      .map_err(Error::from_store)?;
    if let Some(unknown) = tutor_ids
      .iter()
      .find(|id| !tutors.iter().any(|t| t.tutor_id == **id))
    {
      return Err(
        olymp_core::Error::InvalidTutorSet(format!("unknown tutor {unknown}"))
          .into(),
      );
    }

    let call: Call = resolve_open_call(&*self.store, area_id, Utc::now()).await?;

    let view = self
      .store
      .create_enrollment(NewEnrollment {
        competitor_id,
        area_id,
        call_id: call.call_id,
        category_id,
        tutor_ids,
      })
      .await
      .map_err(Error::from_store)?;

    tracing::info!(
      enrollment_id = %view.enrollment.enrollment_id,
      %competitor_id,
      %area_id,
      call_id = %call.call_id,
      tutors = view.decisions.len(),
      "enrollment created"
    );

    for tutor in &tutors {
      self
        .notify_quietly(tutor.user_id, NotificationKind::Request, REQUEST_MESSAGE)
        .await;
    }

    Ok(view)
  }

  /// Record `tutor_id`'s vote on an enrollment and apply the consensus
  /// verdict. The competitor is notified when the enrollment reaches a
  /// terminal status, or when every tutor has answered without agreement.
  pub async fn decide_enrollment(
    &self,
    enrollment_id: Uuid,
    tutor_id: Uuid,
    vote: Vote,
  ) -> Result<DecisionOutcome> {
    let outcome = self
      .store
      .record_decision(DecisionInput { enrollment_id, tutor_id, vote }, self.policy)
      .await
      .map_err(Error::from_store)?;

    tracing::info!(
      %enrollment_id,
      %tutor_id,
      decision = outcome.decision.decision.as_ref(),
      verdict = ?outcome.verdict,
      "tutor decision recorded"
    );

    let message = match outcome.verdict {
      Verdict::Accept if outcome.transitioned => Some(APPROVED_MESSAGE),
      Verdict::Reject if outcome.transitioned => Some(REJECTED_MESSAGE),
      Verdict::Split => Some(SPLIT_MESSAGE),
      _ => None,
    };

    if outcome.transitioned {
      tracing::info!(
        %enrollment_id,
        status = outcome.enrollment.status.as_ref(),
        "enrollment status changed"
      );
    }

    if let Some(message) = message {
      self.notify_competitor(&outcome.enrollment, message).await;
    }

    Ok(outcome)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn list_rejection_reasons(&self) -> Result<Vec<RejectionReason>> {
    self
      .store
      .list_rejection_reasons()
      .await
      .map_err(Error::from_store)
  }

  /// Enrollments still waiting on `tutor_id`, oldest first.
  pub async fn list_pending_decisions_for_tutor(
    &self,
    tutor_id: Uuid,
  ) -> Result<Vec<Enrollment>> {
    self
      .store
      .pending_for_tutor(tutor_id)
      .await
      .map_err(Error::from_store)
  }

  pub async fn list_assignments_for_tutor(
    &self,
    tutor_id: Uuid,
  ) -> Result<Vec<TutorAssignment>> {
    self
      .store
      .assignments_for_tutor(tutor_id)
      .await
      .map_err(Error::from_store)
  }

  /// Every enrollment of a competitor with its decision links, newest first.
  pub async fn list_enrollments_for_competitor(
    &self,
    competitor_id: Uuid,
  ) -> Result<Vec<EnrollmentView>> {
    self
      .store
      .enrollments_for_competitor(competitor_id)
      .await
      .map_err(Error::from_store)
  }

  /// Areas of `call_id` the competitor may still pick. Under the cap that is
  /// every offered area; at the cap only the areas already enrolled remain.
  pub async fn list_available_areas(
    &self,
    competitor_id: Uuid,
    call_id: Uuid,
  ) -> Result<Vec<Area>> {
    let offered = self
      .store
      .areas_for_call(call_id)
      .await
      .map_err(Error::from_store)?;

    let enrolled: Vec<Uuid> = self
      .store
      .enrollments_for_competitor(competitor_id)
      .await
      .map_err(Error::from_store)?
      .into_iter()
      .filter(|v| v.enrollment.call_id == call_id)
      .map(|v| v.enrollment.area_id)
      .collect();

    if has_room(enrolled.len()) {
      return Ok(offered);
    }
    Ok(
      offered
        .into_iter()
        .filter(|a| enrolled.contains(&a.area_id))
        .collect(),
    )
  }

  /// Stored notifications of `user_id`, newest first.
  pub async fn list_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>> {
    self
      .store
      .notifications_for_user(user_id)
      .await
      .map_err(Error::from_store)
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn notify_competitor(&self, enrollment: &Enrollment, message: &str) {
    let competitor = match self.store.get_competitor(enrollment.competitor_id).await {
      Ok(Some(competitor)) => competitor,
      Ok(None) => {
        tracing::warn!(
          competitor_id = %enrollment.competitor_id,
          "competitor vanished; status notification skipped"
        );
        return;
      }
      Err(e) => {
        tracing::warn!(error = %e, "competitor lookup failed; status notification skipped");
        return;
      }
    };

    self
      .notify_quietly(competitor.user_id, NotificationKind::Status, message)
      .await;
  }

  async fn notify_quietly(&self, user_id: Uuid, kind: NotificationKind, message: &str) {
    if let Err(e) = self.dispatcher.notify(user_id, kind, message).await {
      tracing::warn!(%user_id, error = %e, "notification failed");
    }
  }
}
