//! The per-call area cap.

use uuid::Uuid;

use crate::{Error, Result};

/// Maximum number of area enrollments a competitor may hold in one call.
pub const MAX_AREAS_PER_CALL: usize = 2;

/// Decide whether a competitor with `existing` enrollments in `call_id` may
/// enroll in one more area.
///
/// Every enrollment counts, whatever its status. Callers must evaluate this
/// inside the same atomic unit as the insert it guards.
pub fn check_area_cap(
  competitor_id: Uuid,
  call_id: Uuid,
  existing: usize,
) -> Result<()> {
  if existing >= MAX_AREAS_PER_CALL {
    return Err(Error::AreaCapExceeded {
      competitor_id,
      call_id,
      existing,
      limit: MAX_AREAS_PER_CALL,
    });
  }
  Ok(())
}

/// Whether a competitor holding `existing` enrollments can still pick a new
/// area.
pub fn has_room(existing: usize) -> bool { existing < MAX_AREAS_PER_CALL }
