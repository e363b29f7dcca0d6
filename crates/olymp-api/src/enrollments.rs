//! Handlers for `/enrollments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/enrollments` | Body: `{"area_id","category_id","tutor_ids":[…]}` |
//! | `GET`  | `/enrollments/mine` | Newest first, with decision links |
//! | `POST` | `/enrollments/{id}/approve` | No body |
//! | `POST` | `/enrollments/{id}/reject` | Body: `{"reason_id":7,"elaboration":"…"}` |
//!
//! A reject sent without a body is treated as one without a reason.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use olymp_core::{
  consensus::Verdict,
  enrollment::{
    DecisionOutcome, EnrollmentStatus, EnrollmentView, TutorDecision, Vote,
  },
  identity::Role,
  store::OlympiadStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, extract::JsonBody, identity::Caller};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub area_id:     Uuid,
  pub category_id: Uuid,
  pub tutor_ids:   Vec<Uuid>,
}

/// `POST /enrollments`: returns 201 with the enrollment and its links.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<(StatusCode, Json<EnrollmentView>), ApiError>
where
  S: OlympiadStore,
{
  caller.require(Role::Competitor)?;
  let competitor = state.workflow.competitor_for_user(caller.subject_id).await?;

  let view = state
    .workflow
    .create_enrollment(
      competitor.competitor_id,
      body.area_id,
      body.category_id,
      body.tutor_ids,
    )
    .await?;
  Ok((StatusCode::CREATED, Json(view)))
}

// ─── Mine ─────────────────────────────────────────────────────────────────────

/// `GET /enrollments/mine`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
) -> Result<Json<Vec<EnrollmentView>>, ApiError>
where
  S: OlympiadStore,
{
  caller.require(Role::Competitor)?;
  let competitor = state.workflow.competitor_for_user(caller.subject_id).await?;
  let views = state
    .workflow
    .list_enrollments_for_competitor(competitor.competitor_id)
    .await?;
  Ok(Json(views))
}

// ─── Decide ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct DecisionResponse {
  pub enrollment_id: Uuid,
  pub status:        EnrollmentStatus,
  pub verdict:       Verdict,
  pub decision:      TutorDecision,
}

impl From<DecisionOutcome> for DecisionResponse {
  fn from(outcome: DecisionOutcome) -> Self {
    Self {
      enrollment_id: outcome.enrollment.enrollment_id,
      status:        outcome.enrollment.status,
      verdict:       outcome.verdict,
      decision:      outcome.decision,
    }
  }
}

async fn decide<S>(
  state: &AppState<S>,
  caller: Caller,
  enrollment_id: Uuid,
  vote: Vote,
) -> Result<Json<DecisionResponse>, ApiError>
where
  S: OlympiadStore,
{
  caller.require(Role::Tutor)?;
  let tutor = state.workflow.tutor_for_user(caller.subject_id).await?;
  let outcome = state
    .workflow
    .decide_enrollment(enrollment_id, tutor.tutor_id, vote)
    .await?;
  Ok(Json(outcome.into()))
}

/// `POST /enrollments/{id}/approve`
pub async fn approve<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
) -> Result<Json<DecisionResponse>, ApiError>
where
  S: OlympiadStore,
{
  decide(&state, caller, id, Vote::Approve).await
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
  pub reason_id:   Option<i64>,
  pub elaboration: Option<String>,
}

/// `POST /enrollments/{id}/reject`
pub async fn reject<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(id): Path<Uuid>,
  body: Option<JsonBody<RejectBody>>,
) -> Result<Json<DecisionResponse>, ApiError>
where
  S: OlympiadStore,
{
  let vote = match body {
    Some(JsonBody(body)) => {
      Vote::Reject { reason_id: body.reason_id, elaboration: body.elaboration }
    }
    None => Vote::Reject { reason_id: None, elaboration: None },
  };
  decide(&state, caller, id, vote).await
}
