//! Caller identity extractor.
//!
//! Sessions are issued upstream. The gateway forwards the verified user id
//! in `x-subject-id` and the role in `x-role`; requests without them are
//! refused with 401.

use std::ops::Deref;

use axum::{extract::FromRequestParts, http::request::Parts};
use olymp_core::identity::{Identity, Role};
use uuid::Uuid;

use crate::error::ApiError;

pub const SUBJECT_HEADER: &str = "x-subject-id";
pub const ROLE_HEADER: &str = "x-role";

/// The identified caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Identity);

impl Caller {
  /// Refuse the request unless the caller acts in `role`.
  pub fn require(&self, role: Role) -> Result<(), ApiError> {
    if self.0.role != role {
      return Err(ApiError::Forbidden(format!(
        "this operation requires the {} role",
        role.as_ref()
      )));
    }
    Ok(())
  }
}

impl Deref for Caller {
  type Target = Identity;

  fn deref(&self) -> &Identity { &self.0 }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
  parts
    .headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| ApiError::Unauthorized(format!("missing {name} header")))
}

impl<St> FromRequestParts<St> for Caller
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    let subject_id: Uuid = header(parts, SUBJECT_HEADER)?
      .parse()
      .map_err(|_| ApiError::Unauthorized(format!("malformed {SUBJECT_HEADER}")))?;
    let role: Role = header(parts, ROLE_HEADER)?
      .parse()
      .map_err(|_| ApiError::Unauthorized(format!("unknown {ROLE_HEADER}")))?;

    Ok(Caller(Identity { subject_id, role }))
  }
}
