//! `GET /notifications`: the caller's stored notifications, newest first.

use axum::{Json, extract::State};
use olymp_core::{notification::Notification, store::OlympiadStore};

use crate::{AppState, error::ApiError, identity::Caller};

pub async fn list<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: OlympiadStore,
{
  Ok(Json(state.workflow.list_notifications(caller.subject_id).await?))
}
