//! Handlers for `/tutor/*` endpoints.

use axum::{Json, extract::State};
use olymp_core::{
  enrollment::{Enrollment, TutorAssignment},
  identity::Role,
  store::OlympiadStore,
};

use crate::{AppState, error::ApiError, identity::Caller};

/// `GET /tutor/pending`, oldest first.
pub async fn pending<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
) -> Result<Json<Vec<Enrollment>>, ApiError>
where
  S: OlympiadStore,
{
  caller.require(Role::Tutor)?;
  let tutor = state.workflow.tutor_for_user(caller.subject_id).await?;
  let pending = state
    .workflow
    .list_pending_decisions_for_tutor(tutor.tutor_id)
    .await?;
  Ok(Json(pending))
}

/// `GET /tutor/assignments`
pub async fn assignments<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
) -> Result<Json<Vec<TutorAssignment>>, ApiError>
where
  S: OlympiadStore,
{
  caller.require(Role::Tutor)?;
  let tutor = state.workflow.tutor_for_user(caller.subject_id).await?;
  Ok(Json(state.workflow.list_assignments_for_tutor(tutor.tutor_id).await?))
}
