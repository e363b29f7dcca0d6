//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveDate, Utc};
use olymp_core::{
  Error as CoreError,
  call::{CallSchedule, CallStatus, NewCall},
  catalog::{NewCompetitor, OTHER_REASON_ID},
  consensus::{ConsensusPolicy, Verdict},
  enrollment::{DecisionInput, DecisionState, EnrollmentStatus, NewEnrollment, Vote},
  notification::{NewNotification, NotificationKind},
  store::{OlympiadStore, StoreError},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn schedule_from(start: chrono::DateTime<Utc>) -> CallSchedule {
  CallSchedule {
    registration_start: start,
    registration_end:   start + Duration::days(10),
    payment_start:      start + Duration::days(1),
    payment_end:        start + Duration::days(12),
    competition_start:  start + Duration::days(20),
    competition_end:    start + Duration::days(21),
  }
}

fn open_call(name: &str) -> NewCall {
  NewCall {
    name:        name.into(),
    description: String::new(),
    status:      CallStatus::Open,
    schedule:    schedule_from(Utc::now() - Duration::days(1)),
  }
}

/// A store with one open call offering three areas, one category, one
/// competitor and three tutors.
struct Fixture {
  store:      SqliteStore,
  call_id:    Uuid,
  areas:      Vec<Uuid>,
  category:   Uuid,
  competitor: Uuid,
  tutors:     Vec<Uuid>,
}

async fn fixture() -> Fixture {
  fixture_in(store().await).await
}

async fn fixture_in(store: SqliteStore) -> Fixture {
  let call = store.add_call(open_call("Olympiad 2026")).await.unwrap();

  let mut areas = Vec::new();
  for name in ["Mathematics", "Physics", "Chemistry"] {
    let area = store.add_area(name.into(), 1500).await.unwrap();
    store.offer_area(call.call_id, area.area_id).await.unwrap();
    areas.push(area.area_id);
  }

  let category = store.add_category("Primero Secundaria".into()).await.unwrap();
  let competitor = store
    .add_competitor(NewCompetitor {
      user_id:    Uuid::new_v4(),
      full_name:  "Ana Quispe".into(),
      birth_date: NaiveDate::from_ymd_opt(2010, 4, 2).unwrap(),
      school:     Some("Colegio San Martín".into()),
    })
    .await
    .unwrap();

  let mut tutors = Vec::new();
  for name in ["Luis", "Marta", "Rene"] {
    let tutor = store.add_tutor(Uuid::new_v4(), name.into()).await.unwrap();
    tutors.push(tutor.tutor_id);
  }

  Fixture {
    store,
    call_id: call.call_id,
    areas,
    category: category.category_id,
    competitor: competitor.competitor_id,
    tutors,
  }
}

impl Fixture {
  fn enrollment(&self, area: usize, tutors: &[usize]) -> NewEnrollment {
    NewEnrollment {
      competitor_id: self.competitor,
      area_id:       self.areas[area],
      call_id:       self.call_id,
      category_id:   self.category,
      tutor_ids:     tutors.iter().map(|i| self.tutors[*i]).collect(),
    }
  }

  async fn decide(
    &self,
    enrollment_id: Uuid,
    tutor: usize,
    vote: Vote,
  ) -> crate::Result<olymp_core::enrollment::DecisionOutcome> {
    self
      .store
      .record_decision(
        DecisionInput { enrollment_id, tutor_id: self.tutors[tutor], vote },
        ConsensusPolicy::Unanimous,
      )
      .await
  }
}

fn reject(reason_id: i64) -> Vote {
  Vote::Reject { reason_id: Some(reason_id), elaboration: None }
}

fn core(err: Error) -> CoreError {
  err.into_rejection().expect("domain rejection")
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn incoherent_schedule_is_refused() {
  let s = store().await;
  let mut call = open_call("Broken");
  call.schedule.payment_start = call.schedule.registration_start - Duration::days(1);

  let err = s.add_call(call).await.unwrap_err();
  assert!(matches!(core(err), CoreError::InvalidSchedule(_)));
}

#[tokio::test]
async fn set_call_status_round_trips_code() {
  let s = store().await;
  let mut draft = open_call("Draft");
  draft.status = CallStatus::Draft;
  let call = s.add_call(draft).await.unwrap();

  let updated = s.set_call_status(call.call_id, CallStatus::Closed).await.unwrap();
  assert_eq!(updated.status, CallStatus::Closed);

  let err = s.set_call_status(Uuid::new_v4(), CallStatus::Open).await.unwrap_err();
  assert!(matches!(core(err), CoreError::CallNotFound(_)));
}

#[tokio::test]
async fn offering_twice_is_a_no_op() {
  let f = fixture().await;
  f.store.offer_area(f.call_id, f.areas[0]).await.unwrap();
  assert_eq!(f.store.areas_for_call(f.call_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn overlapping_calls_cannot_share_an_area() {
  let f = fixture().await;
  let other = f.store.add_call(open_call("Overlap")).await.unwrap();

  let err = f.store.offer_area(other.call_id, f.areas[0]).await.unwrap_err();
  assert!(matches!(
    core(err),
    CoreError::AreaAlreadyOffered { other_call_id, .. } if other_call_id == f.call_id
  ));

  let mut later = open_call("Next year");
  later.schedule = schedule_from(Utc::now() + Duration::days(365));
  let later = f.store.add_call(later).await.unwrap();
  f.store.offer_area(later.call_id, f.areas[0]).await.unwrap();
}

#[tokio::test]
async fn open_calls_filter_on_status_and_window() {
  let f = fixture().await;
  let now = Utc::now();

  let open = f.store.open_calls_for_area(f.areas[0], now).await.unwrap();
  assert_eq!(open.len(), 1);
  assert_eq!(open[0].call_id, f.call_id);

  let after = f
    .store
    .open_calls_for_area(f.areas[0], now + Duration::days(30))
    .await
    .unwrap();
  assert!(after.is_empty());

  f.store.set_call_status(f.call_id, CallStatus::InPayment).await.unwrap();
  assert!(f.store.open_calls_for_area(f.areas[0], now).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejection_reasons_are_seeded() {
  let s = store().await;
  let reasons = s.list_rejection_reasons().await.unwrap();
  assert_eq!(reasons.len(), 7);
  assert!(reasons.iter().any(|r| r.reason_id == OTHER_REASON_ID));
}

#[tokio::test]
async fn tutors_by_ids_skips_unknown() {
  let f = fixture().await;
  let found = f
    .store
    .tutors_by_ids(vec![f.tutors[0], Uuid::new_v4(), f.tutors[2]])
    .await
    .unwrap();
  assert_eq!(found.len(), 2);
  assert!(f.store.tutors_by_ids(Vec::new()).await.unwrap().is_empty());
}

// ─── Enrollment creation ─────────────────────────────────────────────────────

#[tokio::test]
async fn create_enrollment_inserts_undecided_links() {
  let f = fixture().await;
  let view = f.store.create_enrollment(f.enrollment(0, &[0, 1])).await.unwrap();

  assert_eq!(view.enrollment.status, EnrollmentStatus::Pending);
  assert!(view.enrollment.status_changed_at.is_none());
  assert_eq!(view.decisions.len(), 2);
  assert!(view.decisions.iter().all(|d| d.decision == DecisionState::Undecided));

  let fetched = f
    .store
    .get_enrollment(view.enrollment.enrollment_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched.decisions.len(), 2);
}

#[tokio::test]
async fn duplicate_enrollment_is_refused() {
  let f = fixture().await;
  f.store.create_enrollment(f.enrollment(0, &[0])).await.unwrap();

  let err = f.store.create_enrollment(f.enrollment(0, &[1])).await.unwrap_err();
  assert!(matches!(core(err), CoreError::DuplicateEnrollment { .. }));
}

#[tokio::test]
async fn third_area_exceeds_cap() {
  let f = fixture().await;
  f.store.create_enrollment(f.enrollment(0, &[0])).await.unwrap();
  f.store.create_enrollment(f.enrollment(1, &[0])).await.unwrap();

  let err = f.store.create_enrollment(f.enrollment(2, &[0])).await.unwrap_err();
  assert!(matches!(
    core(err),
    CoreError::AreaCapExceeded { existing: 2, limit: 2, .. }
  ));

  let all = f.store.enrollments_for_competitor(f.competitor).await.unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn rejected_enrollments_still_count_toward_cap() {
  let f = fixture().await;
  let first = f.store.create_enrollment(f.enrollment(0, &[0])).await.unwrap();
  f.decide(first.enrollment.enrollment_id, 0, reject(1)).await.unwrap();
  f.store.create_enrollment(f.enrollment(1, &[0])).await.unwrap();

  let err = f.store.create_enrollment(f.enrollment(2, &[0])).await.unwrap_err();
  assert!(matches!(core(err), CoreError::AreaCapExceeded { .. }));
}

/// Offer `extra` more areas in the fixture's call so a competitor has more
/// candidate areas than the cap allows.
async fn offer_more_areas(f: &mut Fixture, extra: usize) {
  for i in 0..extra {
    let area = f.store.add_area(format!("Extra {i}"), 1000).await.unwrap();
    f.store.offer_area(f.call_id, area.area_id).await.unwrap();
    f.areas.push(area.area_id);
  }
}

#[tokio::test]
async fn concurrent_creates_respect_cap() {
  let mut f = fixture().await;
  offer_more_areas(&mut f, 3).await;

  let handles: Vec<_> = (0..f.areas.len())
    .map(|area| {
      let store = f.store.clone();
      let input = f.enrollment(area, &[0]);
      tokio::spawn(async move { store.create_enrollment(input).await })
    })
    .collect();

  let mut accepted = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => accepted += 1,
      Err(err) => assert!(matches!(core(err), CoreError::AreaCapExceeded { .. })),
    }
  }
  assert_eq!(accepted, 2);

  let all = f.store.enrollments_for_competitor(f.competitor).await.unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn separate_handles_on_one_file_respect_cap() {
  let path = std::env::temp_dir().join(format!("olymp-{}.db", Uuid::new_v4()));

  let first = SqliteStore::open(&path).await.unwrap();
  let mut f = fixture_in(first).await;
  offer_more_areas(&mut f, 3).await;
  let second = SqliteStore::open(&path).await.unwrap();

  let handles: Vec<_> = (0..f.areas.len())
    .map(|area| {
      let store = if area % 2 == 0 { f.store.clone() } else { second.clone() };
      let input = f.enrollment(area, &[0]);
      tokio::spawn(async move { store.create_enrollment(input).await })
    })
    .collect();

  let mut accepted = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => accepted += 1,
      Err(err) => assert!(matches!(core(err), CoreError::AreaCapExceeded { .. })),
    }
  }
  assert_eq!(accepted, 2);
  assert_eq!(second.enrollments_for_competitor(f.competitor).await.unwrap().len(), 2);

  drop((f, second));
  for suffix in ["", "-wal", "-shm"] {
    let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
  }
}

#[tokio::test]
async fn failed_link_insert_rolls_back_creation() {
  let f = fixture().await;
  let mut input = f.enrollment(0, &[0, 1]);
  input.tutor_ids.push(Uuid::new_v4());

  let err = f.store.create_enrollment(input).await.unwrap_err();
  assert!(err.into_rejection().is_err(), "a foreign key failure is not a rejection");
  assert!(f.store.enrollments_for_competitor(f.competitor).await.unwrap().is_empty());
  assert!(f.store.pending_for_tutor(f.tutors[0]).await.unwrap().is_empty());

  let view = f.store.create_enrollment(f.enrollment(0, &[0, 1, 2])).await.unwrap();
  assert_eq!(view.decisions.len(), 3);
  let all = f.store.enrollments_for_competitor(f.competitor).await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].decisions.len(), 3);
}

#[tokio::test]
async fn unknown_category_is_refused_without_writes() {
  let f = fixture().await;
  let mut input = f.enrollment(0, &[0]);
  input.category_id = Uuid::new_v4();

  let err = f.store.create_enrollment(input).await.unwrap_err();
  assert!(matches!(core(err), CoreError::CategoryNotFound(_)));
  assert!(f.store.enrollments_for_competitor(f.competitor).await.unwrap().is_empty());
}

// ─── Decisions ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn unanimous_approval_accepts() {
  let f = fixture().await;
  let view = f.store.create_enrollment(f.enrollment(0, &[0, 1])).await.unwrap();
  let id = view.enrollment.enrollment_id;

  let first = f.decide(id, 0, Vote::Approve).await.unwrap();
  assert_eq!(first.verdict, Verdict::Awaiting);
  assert!(!first.transitioned);
  assert_eq!(first.enrollment.status, EnrollmentStatus::Pending);
  assert_eq!(first.decision.decision, DecisionState::Approved);
  assert!(first.decision.decided_at.is_some());

  let second = f.decide(id, 1, Vote::Approve).await.unwrap();
  assert_eq!(second.verdict, Verdict::Accept);
  assert!(second.transitioned);
  assert_eq!(second.enrollment.status, EnrollmentStatus::Accepted);
  assert!(second.enrollment.status_changed_at.is_some());
}

#[tokio::test]
async fn unanimous_rejection_rejects() {
  let f = fixture().await;
  let view = f.store.create_enrollment(f.enrollment(0, &[0, 1])).await.unwrap();
  let id = view.enrollment.enrollment_id;

  f.decide(id, 0, reject(2)).await.unwrap();
  let last = f.decide(id, 1, reject(3)).await.unwrap();
  assert_eq!(last.verdict, Verdict::Reject);
  assert_eq!(last.enrollment.status, EnrollmentStatus::Rejected);
}

#[tokio::test]
async fn mixed_decisions_stay_pending_under_unanimous() {
  let f = fixture().await;
  let view = f.store.create_enrollment(f.enrollment(0, &[0, 1])).await.unwrap();
  let id = view.enrollment.enrollment_id;

  f.decide(id, 0, Vote::Approve).await.unwrap();
  let last = f.decide(id, 1, reject(4)).await.unwrap();
  assert_eq!(last.verdict, Verdict::Split);
  assert!(!last.transitioned);
  assert_eq!(last.enrollment.status, EnrollmentStatus::Pending);
}

#[tokio::test]
async fn any_rejection_policy_rejects_mixed_set() {
  let f = fixture().await;
  let view = f.store.create_enrollment(f.enrollment(0, &[0, 1])).await.unwrap();
  let id = view.enrollment.enrollment_id;

  let input = |tutor: usize, vote: Vote| DecisionInput {
    enrollment_id: id,
    tutor_id: f.tutors[tutor],
    vote,
  };
  f.store
    .record_decision(input(0, reject(5)), ConsensusPolicy::AnyRejection)
    .await
    .unwrap();
  let last = f
    .store
    .record_decision(input(1, Vote::Approve), ConsensusPolicy::AnyRejection)
    .await
    .unwrap();
  assert_eq!(last.enrollment.status, EnrollmentStatus::Rejected);
}

#[tokio::test]
async fn deciding_twice_is_refused() {
  let f = fixture().await;
  let view = f.store.create_enrollment(f.enrollment(0, &[0, 1])).await.unwrap();
  let id = view.enrollment.enrollment_id;

  f.decide(id, 0, Vote::Approve).await.unwrap();
  let err = f.decide(id, 0, reject(1)).await.unwrap_err();
  assert!(matches!(core(err), CoreError::AlreadyDecided { .. }));

  let fetched = f.store.get_enrollment(id).await.unwrap().unwrap();
  let link = fetched
    .decisions
    .iter()
    .find(|d| d.tutor_id == f.tutors[0])
    .unwrap();
  assert_eq!(link.decision, DecisionState::Approved);
}

#[tokio::test]
async fn unassigned_tutor_has_no_link() {
  let f = fixture().await;
  let view = f.store.create_enrollment(f.enrollment(0, &[0])).await.unwrap();

  let err = f
    .decide(view.enrollment.enrollment_id, 2, Vote::Approve)
    .await
    .unwrap_err();
  assert!(matches!(core(err), CoreError::NoSuchLink { .. }));
}

#[tokio::test]
async fn decision_on_missing_enrollment_is_not_found() {
  let f = fixture().await;
  let missing = Uuid::new_v4();

  let err = f.decide(missing, 0, Vote::Approve).await.unwrap_err();
  assert_eq!(core(err), CoreError::EnrollmentNotFound(missing));
}

#[tokio::test]
async fn rejection_reason_is_validated() {
  let f = fixture().await;
  let view = f.store.create_enrollment(f.enrollment(0, &[0])).await.unwrap();
  let id = view.enrollment.enrollment_id;

  let missing = Vote::Reject { reason_id: None, elaboration: None };
  let err = f.decide(id, 0, missing).await.unwrap_err();
  assert!(matches!(core(err), CoreError::MissingReason));

  let err = f.decide(id, 0, reject(99)).await.unwrap_err();
  assert!(matches!(core(err), CoreError::UnknownReason(99)));

  // Failed attempts leave the link untouched.
  let fetched = f.store.get_enrollment(id).await.unwrap().unwrap();
  assert_eq!(fetched.decisions[0].decision, DecisionState::Undecided);
}

#[tokio::test]
async fn elaboration_persists_only_for_other_reason() {
  let f = fixture().await;
  let view = f.store.create_enrollment(f.enrollment(0, &[0, 1])).await.unwrap();
  let id = view.enrollment.enrollment_id;

  let other = f
    .decide(id, 0, Vote::Reject {
      reason_id:   Some(OTHER_REASON_ID),
      elaboration: Some("Guardian did not consent".into()),
    })
    .await
    .unwrap();
  assert_eq!(other.decision.elaboration.as_deref(), Some("Guardian did not consent"));

  let listed = f
    .decide(id, 1, Vote::Reject {
      reason_id:   Some(2),
      elaboration: Some("dropped".into()),
    })
    .await
    .unwrap();
  assert_eq!(listed.decision.reason_id, Some(2));
  assert!(listed.decision.elaboration.is_none());
}

#[tokio::test]
async fn concurrent_last_approvals_transition_once() {
  let f = fixture().await;
  let view = f.store.create_enrollment(f.enrollment(0, &[0, 1, 2])).await.unwrap();
  let id = view.enrollment.enrollment_id;
  f.decide(id, 0, Vote::Approve).await.unwrap();

  let spawn = |tutor: usize| {
    let store = f.store.clone();
    let input = DecisionInput { enrollment_id: id, tutor_id: f.tutors[tutor], vote: Vote::Approve };
    tokio::spawn(async move {
      store.record_decision(input, ConsensusPolicy::Unanimous).await
    })
  };
  let (a, b) = (spawn(1), spawn(2));
  let outcomes = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];

  assert_eq!(outcomes.iter().filter(|o| o.transitioned).count(), 1);
  let fetched = f.store.get_enrollment(id).await.unwrap().unwrap();
  assert_eq!(fetched.enrollment.status, EnrollmentStatus::Accepted);
}

// ─── Listings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn competitor_listing_is_newest_first() {
  let f = fixture().await;
  let first = f.store.create_enrollment(f.enrollment(0, &[0])).await.unwrap();
  let second = f.store.create_enrollment(f.enrollment(1, &[1, 2])).await.unwrap();

  let all = f.store.enrollments_for_competitor(f.competitor).await.unwrap();
  assert_eq!(all[0].enrollment.enrollment_id, second.enrollment.enrollment_id);
  assert_eq!(all[1].enrollment.enrollment_id, first.enrollment.enrollment_id);
  assert_eq!(all[0].decisions.len(), 2);
  assert_eq!(all[1].decisions.len(), 1);
}

#[tokio::test]
async fn tutor_pending_and_assignments() {
  let f = fixture().await;
  let first = f.store.create_enrollment(f.enrollment(0, &[0, 1])).await.unwrap();
  let second = f.store.create_enrollment(f.enrollment(1, &[0])).await.unwrap();

  let pending = f.store.pending_for_tutor(f.tutors[0]).await.unwrap();
  assert_eq!(pending.len(), 2);
  assert_eq!(pending[0].enrollment_id, first.enrollment.enrollment_id);

  f.decide(second.enrollment.enrollment_id, 0, Vote::Approve).await.unwrap();
  let pending = f.store.pending_for_tutor(f.tutors[0]).await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].enrollment_id, first.enrollment.enrollment_id);

  let assignments = f.store.assignments_for_tutor(f.tutors[0]).await.unwrap();
  assert_eq!(assignments.len(), 2);
  let decided = assignments
    .iter()
    .find(|a| a.enrollment.enrollment_id == second.enrollment.enrollment_id)
    .unwrap();
  assert_eq!(decided.decision.decision, DecisionState::Approved);
  assert_eq!(decided.enrollment.status, EnrollmentStatus::Accepted);

  assert!(f.store.pending_for_tutor(f.tutors[2]).await.unwrap().is_empty());
}

#[tokio::test]
async fn identity_lookups() {
  let f = fixture().await;
  let competitor = f.store.get_competitor(f.competitor).await.unwrap().unwrap();
  let by_user = f
    .store
    .competitor_for_user(competitor.user_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_user.competitor_id, f.competitor);
  assert_eq!(by_user.birth_date, NaiveDate::from_ymd_opt(2010, 4, 2).unwrap());

  let tutor = f.store.tutors_by_ids(vec![f.tutors[1]]).await.unwrap().remove(0);
  let found = f.store.tutor_for_user(tutor.user_id).await.unwrap().unwrap();
  assert_eq!(found.tutor_id, f.tutors[1]);

  assert!(f.store.tutor_for_user(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_are_listed_newest_first() {
  let s = store().await;
  let user = Uuid::new_v4();

  for message in ["first", "second"] {
    s.add_notification(NewNotification {
      user_id: user,
      kind:    NotificationKind::Request,
      message: message.into(),
    })
    .await
    .unwrap();
  }
  s.add_notification(NewNotification {
    user_id: Uuid::new_v4(),
    kind:    NotificationKind::Status,
    message: "someone else".into(),
  })
  .await
  .unwrap();

  let listed = s.notifications_for_user(user).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].message, "second");
  assert_eq!(listed[1].kind, NotificationKind::Request);
}
