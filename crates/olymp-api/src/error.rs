//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use olymp_core::Error as Rejection;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Rejected(#[from] Rejection),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<olymp_workflow::Error> for ApiError {
  fn from(err: olymp_workflow::Error) -> Self {
    match err {
      olymp_workflow::Error::Rejected(e) => ApiError::Rejected(e),
      olymp_workflow::Error::Store(e) => ApiError::Store(e),
    }
  }
}

fn rejection_status(rejection: &Rejection) -> StatusCode {
  use Rejection::*;
  match rejection {
    InvalidTutorSet(_)
    | MissingReason
    | UnknownReason(_)
    | InvalidSchedule(_)
    | UnknownCallStatus(_) => StatusCode::BAD_REQUEST,

    NoSuchLink { .. } => StatusCode::FORBIDDEN,

    CompetitorNotFound(_)
    | TutorNotFound(_)
    | EnrollmentNotFound(_)
    | CallNotFound(_)
    | AreaNotFound(_)
    | CategoryNotFound(_) => StatusCode::NOT_FOUND,

    NoOpenCall(_)
    | AreaCapExceeded { .. }
    | DuplicateEnrollment { .. }
    | AlreadyDecided { .. }
    | AreaAlreadyOffered { .. } => StatusCode::CONFLICT,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code, message) = match &self {
      ApiError::Unauthorized(m) => {
        (StatusCode::UNAUTHORIZED, "unauthorized", m.clone())
      }
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.clone()),
      ApiError::Rejected(e) => (rejection_status(e), e.code(), e.to_string()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal", "internal error".to_owned())
      }
    };
    (status, Json(json!({ "error": message, "code": code }))).into_response()
  }
}
