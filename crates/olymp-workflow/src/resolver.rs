//! Open-call resolution.

use chrono::{DateTime, Utc};
use olymp_core::{call::Call, store::OlympiadStore};
use uuid::Uuid;

use crate::{Error, Result};

/// Pick the call that accepts registrations for `area_id` at `at` from a set
/// of candidates. Earliest registration start wins, then lowest call id.
///
/// Returns the chosen call and how many candidates matched.
pub fn pick_open_call(
  area_id: Uuid,
  candidates: Vec<Call>,
  at: DateTime<Utc>,
) -> Result<(Call, usize)> {
  let mut open: Vec<Call> = candidates
    .into_iter()
    .filter(|c| c.accepts_registrations_at(at))
    .collect();
  open.sort_by_key(|c| (c.schedule.registration_start, c.call_id));

  let matches = open.len();
  open
    .into_iter()
    .next()
    .map(|call| (call, matches))
    .ok_or(Error::Rejected(olymp_core::Error::NoOpenCall(area_id)))
}

/// Find the call currently open for registrations in `area_id`.
pub async fn resolve_open_call<S: OlympiadStore>(
  store: &S,
  area_id: Uuid,
  at: DateTime<Utc>,
) -> Result<Call> {
  let candidates = store
    .open_calls_for_area(area_id, at)
    .await
    .map_err(Error::from_store)?;

  let (call, matches) = pick_open_call(area_id, candidates, at)?;
  if matches > 1 {
    tracing::warn!(
      %area_id,
      matches,
      chosen = %call.call_id,
      "several open calls offer this area; using the earliest"
    );
  }
  Ok(call)
}

#[cfg(test)]
mod tests {
  use chrono::Duration;
  use olymp_core::call::{CallSchedule, CallStatus};

  use super::*;

  fn call(start: DateTime<Utc>, status: CallStatus) -> Call {
    Call {
      call_id: Uuid::new_v4(),
      name: "call".into(),
      description: String::new(),
      status,
      schedule: CallSchedule {
        registration_start: start,
        registration_end:   start + Duration::days(10),
        payment_start:      start + Duration::days(1),
        payment_end:        start + Duration::days(12),
        competition_start:  start + Duration::days(20),
        competition_end:    start + Duration::days(21),
      },
    }
  }

  #[test]
  fn nothing_open_is_an_error() {
    let area = Uuid::new_v4();
    let now = Utc::now();
    let draft = call(now - Duration::days(1), CallStatus::Draft);
    let past = call(now - Duration::days(30), CallStatus::Open);

    let err = pick_open_call(area, vec![draft, past], now).unwrap_err();
    assert!(matches!(
      err.rejection(),
      Some(olymp_core::Error::NoOpenCall(id)) if *id == area
    ));
  }

  #[test]
  fn earliest_registration_start_wins() {
    let now = Utc::now();
    let older = call(now - Duration::days(5), CallStatus::Open);
    let newer = call(now - Duration::days(1), CallStatus::Open);
    let older_id = older.call_id;

    let (chosen, matches) =
      pick_open_call(Uuid::new_v4(), vec![newer, older], now).unwrap();
    assert_eq!(chosen.call_id, older_id);
    assert_eq!(matches, 2);
  }

  #[test]
  fn window_bounds_are_inclusive() {
    let start = Utc::now();
    let open = call(start, CallStatus::Open);
    let end = open.schedule.registration_end;

    assert!(pick_open_call(Uuid::new_v4(), vec![open.clone()], start).is_ok());
    assert!(pick_open_call(Uuid::new_v4(), vec![open.clone()], end).is_ok());
    assert!(
      pick_open_call(Uuid::new_v4(), vec![open], end + Duration::seconds(1))
        .is_err()
    );
  }
}
