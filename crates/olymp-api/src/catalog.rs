//! Read-only catalog endpoints.

use axum::{
  Json,
  extract::{Path, State},
};
use olymp_core::{
  catalog::{Area, RejectionReason},
  identity::Role,
  store::OlympiadStore,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError, identity::Caller};

/// `GET /rejection-reasons`, open to anyone.
pub async fn rejection_reasons<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<RejectionReason>>, ApiError>
where
  S: OlympiadStore,
{
  Ok(Json(state.workflow.list_rejection_reasons().await?))
}

/// `GET /calls/{id}/available-areas`: the areas the calling competitor may
/// still pick in this call.
pub async fn available_areas<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
  Path(call_id): Path<Uuid>,
) -> Result<Json<Vec<Area>>, ApiError>
where
  S: OlympiadStore,
{
  caller.require(Role::Competitor)?;
  let competitor = state.workflow.competitor_for_user(caller.subject_id).await?;
  let areas = state
    .workflow
    .list_available_areas(competitor.competitor_id, call_id)
    .await?;
  Ok(Json(areas))
}
