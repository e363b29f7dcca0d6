//! Demo data for local runs (`server --seed-demo`).

use chrono::{Duration, NaiveDate, Utc};
use olymp_core::{
  call::{CallSchedule, CallStatus, NewCall},
  catalog::NewCompetitor,
  store::OlympiadStore,
};
use uuid::Uuid;

/// Ids of the seeded records, logged so they can be used as request headers.
#[derive(Debug, Clone)]
pub struct DemoSeed {
  pub call_id:         Uuid,
  pub area_ids:        Vec<Uuid>,
  pub category_id:     Uuid,
  pub competitor_user: Uuid,
  pub tutor_users:     Vec<Uuid>,
  pub tutor_ids:       Vec<Uuid>,
}

/// Insert an open call with two areas, a category, two tutors and one
/// competitor.
pub async fn seed_demo<S: OlympiadStore>(store: &S) -> Result<DemoSeed, S::Error> {
  let start = Utc::now() - Duration::days(1);
  let call = store
    .add_call(NewCall {
      name:        "Demo Olympiad".into(),
      description: "Seeded for local testing".into(),
      status:      CallStatus::Open,
      schedule:    CallSchedule {
        registration_start: start,
        registration_end:   start + Duration::days(30),
        payment_start:      start + Duration::days(1),
        payment_end:        start + Duration::days(35),
        competition_start:  start + Duration::days(40),
        competition_end:    start + Duration::days(41),
      },
    })
    .await?;

  let mut area_ids = Vec::new();
  for (name, fee) in [("Mathematics", 1500), ("Informatics", 2000)] {
    let area = store.add_area(name.into(), fee).await?;
    store.offer_area(call.call_id, area.area_id).await?;
    area_ids.push(area.area_id);
  }

  let category = store.add_category("Secondary, first year".into()).await?;

  let mut tutor_users = Vec::new();
  let mut tutor_ids = Vec::new();
  for name in ["Demo Tutor A", "Demo Tutor B"] {
    let tutor = store.add_tutor(Uuid::new_v4(), name.into()).await?;
    tutor_users.push(tutor.user_id);
    tutor_ids.push(tutor.tutor_id);
  }

  let competitor = store
    .add_competitor(NewCompetitor {
      user_id:    Uuid::new_v4(),
      full_name:  "Demo Competitor".into(),
      birth_date: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
      school:     Some("Demo School".into()),
    })
    .await?;

  Ok(DemoSeed {
    call_id: call.call_id,
    area_ids,
    category_id: category.category_id,
    competitor_user: competitor.user_id,
    tutor_users,
    tutor_ids,
  })
}
