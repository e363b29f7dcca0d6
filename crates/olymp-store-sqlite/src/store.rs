//! [`SqliteStore`], the SQLite implementation of [`OlympiadStore`].

use std::{collections::HashMap, path::Path, time::Duration};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use olymp_core::{
  call::{Call, CallStatus, NewCall},
  cap::check_area_cap,
  catalog::{Area, Category, Competitor, NewCompetitor, RejectionReason, Tutor},
  consensus::ConsensusPolicy,
  enrollment::{
    DecisionInput, DecisionOutcome, DecisionState, Enrollment, EnrollmentStatus,
    EnrollmentView, NewEnrollment, TutorAssignment, TutorDecision,
  },
  notification::{NewNotification, Notification},
  store::OlympiadStore,
};

use crate::{
  Error, Result,
  encode::{
    CALL_COLUMNS, DECISION_COLUMNS, ENROLLMENT_COLUMNS, RawArea, RawCall,
    RawCompetitor, RawDecision, RawEnrollment, RawNotification, RawTutor,
    decode_decision, encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

/// How long a write transaction waits for a lock held by another handle on
/// the same database file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Carry a decode failure out of a connection closure.
fn in_call(e: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An olympiad registration store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_call(&self, call_id: Uuid) -> Result<Option<Call>> {
    let id_str = encode_uuid(call_id);

    let raw: Option<RawCall> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CALL_COLUMNS} FROM calls c WHERE c.call_id = ?1"),
              rusqlite::params![id_str],
              RawCall::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCall::into_call).transpose()
  }

  async fn decisions_for(
    &self,
    enrollment_ids: Vec<String>,
  ) -> Result<HashMap<Uuid, Vec<TutorDecision>>> {
    let raws: Vec<RawDecision> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DECISION_COLUMNS} FROM tutor_decisions d
           WHERE d.enrollment_id = ?1
           ORDER BY d.rowid"
        ))?;
        let mut out = Vec::new();
        for id in &enrollment_ids {
          let rows = stmt
            .query_map(rusqlite::params![id], |row| RawDecision::from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          out.extend(rows);
        }
        Ok(out)
      })
      .await?;

    let mut grouped: HashMap<Uuid, Vec<TutorDecision>> = HashMap::new();
    for raw in raws {
      let decision = raw.into_decision()?;
      grouped.entry(decision.enrollment_id).or_default().push(decision);
    }
    Ok(grouped)
  }

  /// Attach decision links to a list of enrollments, preserving order.
  async fn with_decisions(
    &self,
    enrollments: Vec<Enrollment>,
  ) -> Result<Vec<EnrollmentView>> {
    let ids = enrollments
      .iter()
      .map(|e| encode_uuid(e.enrollment_id))
      .collect();
    let mut grouped = self.decisions_for(ids).await?;

    Ok(
      enrollments
        .into_iter()
        .map(|enrollment| {
          let decisions =
            grouped.remove(&enrollment.enrollment_id).unwrap_or_default();
          EnrollmentView { enrollment, decisions }
        })
        .collect(),
    )
  }
}

// ─── OlympiadStore impl ──────────────────────────────────────────────────────

impl OlympiadStore for SqliteStore {
  type Error = Error;

  // ── Catalog: writes ───────────────────────────────────────────────────────

  async fn add_area(&self, name: String, fee_cents: i64) -> Result<Area> {
    let area = Area { area_id: Uuid::new_v4(), name, fee_cents };

    let id_str = encode_uuid(area.area_id);
    let name   = area.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO areas (area_id, name, fee_cents) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, fee_cents],
        )?;
        Ok(())
      })
      .await?;

    Ok(area)
  }

  async fn add_category(&self, name: String) -> Result<Category> {
    let category = Category { category_id: Uuid::new_v4(), name };

    let id_str = encode_uuid(category.category_id);
    let name   = category.name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO categories (category_id, name) VALUES (?1, ?2)",
          rusqlite::params![id_str, name],
        )?;
        Ok(())
      })
      .await?;

    Ok(category)
  }

  async fn add_tutor(&self, user_id: Uuid, full_name: String) -> Result<Tutor> {
    let tutor = Tutor { tutor_id: Uuid::new_v4(), user_id, full_name };

    let id_str   = encode_uuid(tutor.tutor_id);
    let user_str = encode_uuid(user_id);
    let name     = tutor.full_name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tutors (tutor_id, user_id, full_name) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, user_str, name],
        )?;
        Ok(())
      })
      .await?;

    Ok(tutor)
  }

  async fn add_competitor(&self, input: NewCompetitor) -> Result<Competitor> {
    let competitor = Competitor {
      competitor_id: Uuid::new_v4(),
      user_id:       input.user_id,
      full_name:     input.full_name,
      birth_date:    input.birth_date,
      school:        input.school,
    };

    let id_str    = encode_uuid(competitor.competitor_id);
    let user_str  = encode_uuid(competitor.user_id);
    let name      = competitor.full_name.clone();
    let birth_str = encode_date(competitor.birth_date);
    let school    = competitor.school.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO competitors (competitor_id, user_id, full_name, birth_date, school)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, user_str, name, birth_str, school],
        )?;
        Ok(())
      })
      .await?;

    Ok(competitor)
  }

  async fn add_call(&self, input: NewCall) -> Result<Call> {
    input.schedule.validate()?;

    let call = Call {
      call_id:     Uuid::new_v4(),
      name:        input.name,
      description: input.description,
      status:      input.status,
      schedule:    input.schedule,
    };

    let s = call.schedule;
    let values = [
      encode_uuid(call.call_id),
      call.name.clone(),
      call.description.clone(),
      encode_dt(s.registration_start),
      encode_dt(s.registration_end),
      encode_dt(s.payment_start),
      encode_dt(s.payment_end),
      encode_dt(s.competition_start),
      encode_dt(s.competition_end),
    ];
    let status_code = call.status.code();

    self
      .conn
      .call(move |conn| {
        let [id, name, description, rs, re, ps, pe, cs, ce] = values;
        conn.execute(
          "INSERT INTO calls (
             call_id, name, description, status_code,
             registration_start, registration_end,
             payment_start, payment_end,
             competition_start, competition_end
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![id, name, description, status_code, rs, re, ps, pe, cs, ce],
        )?;
        Ok(())
      })
      .await?;

    Ok(call)
  }

  async fn set_call_status(&self, call_id: Uuid, status: CallStatus) -> Result<Call> {
    let id_str = encode_uuid(call_id);
    let code   = status.code();

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE calls SET status_code = ?1 WHERE call_id = ?2",
          rusqlite::params![code, id_str],
        )?)
      })
      .await?;

    if updated == 0 {
      return Err(olymp_core::Error::CallNotFound(call_id).into());
    }

    self
      .get_call(call_id)
      .await?
      .ok_or(Error::Core(olymp_core::Error::CallNotFound(call_id)))
  }

  async fn offer_area(&self, call_id: Uuid, area_id: Uuid) -> Result<()> {
    let call_str = encode_uuid(call_id);
    let area_str = encode_uuid(area_id);

    let outcome: olymp_core::Result<()> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let this: Option<RawCall> = tx
          .query_row(
            &format!("SELECT {CALL_COLUMNS} FROM calls c WHERE c.call_id = ?1"),
            rusqlite::params![call_str],
            RawCall::from_row,
          )
          .optional()?;
        let Some(this) = this else {
          return Ok(Err(olymp_core::Error::CallNotFound(call_id)));
        };
        let this = this.into_call().map_err(in_call)?;

        let area_exists = tx
          .query_row(
            "SELECT 1 FROM areas WHERE area_id = ?1",
            rusqlite::params![area_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !area_exists {
          return Ok(Err(olymp_core::Error::AreaNotFound(area_id)));
        }

        let others: Vec<RawCall> = {
          let mut stmt = tx.prepare(&format!(
            "SELECT {CALL_COLUMNS} FROM calls c
             JOIN call_areas ca ON ca.call_id = c.call_id
             WHERE ca.area_id = ?1"
          ))?;
          stmt
            .query_map(rusqlite::params![area_str], RawCall::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        for raw in others {
          let other = raw.into_call().map_err(in_call)?;
          if other.call_id == call_id {
            return Ok(Ok(()));
          }
          if other.schedule.registration_overlaps(&this.schedule) {
            return Ok(Err(olymp_core::Error::AreaAlreadyOffered {
              area_id,
              other_call_id: other.call_id,
            }));
          }
        }

        tx.execute(
          "INSERT INTO call_areas (call_id, area_id) VALUES (?1, ?2)",
          rusqlite::params![call_str, area_str],
        )?;
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;

    Ok(outcome?)
  }

  // ── Catalog: reads ────────────────────────────────────────────────────────

  async fn get_competitor(&self, competitor_id: Uuid) -> Result<Option<Competitor>> {
    let id_str = encode_uuid(competitor_id);

    let raw: Option<RawCompetitor> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT competitor_id, user_id, full_name, birth_date, school
               FROM competitors WHERE competitor_id = ?1",
              rusqlite::params![id_str],
              RawCompetitor::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCompetitor::into_competitor).transpose()
  }

  async fn competitor_for_user(&self, user_id: Uuid) -> Result<Option<Competitor>> {
    let user_str = encode_uuid(user_id);

    let raw: Option<RawCompetitor> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT competitor_id, user_id, full_name, birth_date, school
               FROM competitors WHERE user_id = ?1",
              rusqlite::params![user_str],
              RawCompetitor::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCompetitor::into_competitor).transpose()
  }

  async fn tutor_for_user(&self, user_id: Uuid) -> Result<Option<Tutor>> {
    let user_str = encode_uuid(user_id);

    let raw: Option<RawTutor> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT tutor_id, user_id, full_name FROM tutors WHERE user_id = ?1",
              rusqlite::params![user_str],
              RawTutor::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawTutor::into_tutor).transpose()
  }

  async fn tutors_by_ids(&self, tutor_ids: Vec<Uuid>) -> Result<Vec<Tutor>> {
    if tutor_ids.is_empty() {
      return Ok(Vec::new());
    }

    let id_strs: Vec<String> = tutor_ids.into_iter().map(encode_uuid).collect();

    let raws: Vec<RawTutor> = self
      .conn
      .call(move |conn| {
        let placeholders = vec!["?"; id_strs.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
          "SELECT tutor_id, user_id, full_name FROM tutors
           WHERE tutor_id IN ({placeholders})"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(id_strs.iter()), RawTutor::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTutor::into_tutor).collect()
  }

  async fn open_calls_for_area(
    &self,
    area_id: Uuid,
    at:      DateTime<Utc>,
  ) -> Result<Vec<Call>> {
    let area_str  = encode_uuid(area_id);
    let open_code = CallStatus::Open.code();

    let raws: Vec<RawCall> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CALL_COLUMNS} FROM calls c
           JOIN call_areas ca ON ca.call_id = c.call_id
           WHERE ca.area_id = ?1 AND c.status_code = ?2
           ORDER BY c.registration_start, c.call_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![area_str, open_code], RawCall::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let calls = raws
      .into_iter()
      .map(RawCall::into_call)
      .collect::<Result<Vec<_>>>()?;

    Ok(
      calls
        .into_iter()
        .filter(|c| c.accepts_registrations_at(at))
        .collect(),
    )
  }

  async fn areas_for_call(&self, call_id: Uuid) -> Result<Vec<Area>> {
    let call_str = encode_uuid(call_id);

    let raws: Vec<RawArea> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.area_id, a.name, a.fee_cents FROM areas a
           JOIN call_areas ca ON ca.area_id = a.area_id
           WHERE ca.call_id = ?1
           ORDER BY a.name",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![call_str], |row| {
            Ok(RawArea {
              area_id:   row.get(0)?,
              name:      row.get(1)?,
              fee_cents: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawArea::into_area).collect()
  }

  async fn list_rejection_reasons(&self) -> Result<Vec<RejectionReason>> {
    let reasons = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT reason_id, label FROM rejection_reasons ORDER BY reason_id")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RejectionReason {
              reason_id: row.get(0)?,
              label:     row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(reasons)
  }

  // ── Enrollments ───────────────────────────────────────────────────────────

  async fn create_enrollment(&self, input: NewEnrollment) -> Result<EnrollmentView> {
    let enrollment = Enrollment {
      enrollment_id:     Uuid::new_v4(),
      competitor_id:     input.competitor_id,
      area_id:           input.area_id,
      call_id:           input.call_id,
      category_id:       input.category_id,
      created_at:        Utc::now(),
      status:            EnrollmentStatus::Pending,
      status_changed_at: None,
    };
    let decisions: Vec<TutorDecision> = input
      .tutor_ids
      .iter()
      .map(|tutor_id| TutorDecision::undecided(enrollment.enrollment_id, *tutor_id))
      .collect();

    let competitor_id  = enrollment.competitor_id;
    let call_id        = enrollment.call_id;
    let area_id        = enrollment.area_id;
    let category_id    = enrollment.category_id;
    let enrollment_str = encode_uuid(enrollment.enrollment_id);
    let competitor_str = encode_uuid(competitor_id);
    let area_str       = encode_uuid(area_id);
    let call_str       = encode_uuid(call_id);
    let category_str   = encode_uuid(category_id);
    let created_str    = encode_dt(enrollment.created_at);
    let status_str     = enrollment.status.as_ref().to_owned();
    let undecided      = DecisionState::Undecided.as_ref().to_owned();
    let links: Vec<(String, String)> = decisions
      .iter()
      .map(|d| (encode_uuid(d.link_id), encode_uuid(d.tutor_id)))
      .collect();

    let outcome: olymp_core::Result<()> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let competitor_exists = tx
          .query_row(
            "SELECT 1 FROM competitors WHERE competitor_id = ?1",
            rusqlite::params![competitor_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !competitor_exists {
          return Ok(Err(olymp_core::Error::CompetitorNotFound(competitor_id)));
        }

        let category_exists = tx
          .query_row(
            "SELECT 1 FROM categories WHERE category_id = ?1",
            rusqlite::params![category_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !category_exists {
          return Ok(Err(olymp_core::Error::CategoryNotFound(category_id)));
        }

        let duplicate = tx
          .query_row(
            "SELECT 1 FROM enrollments
             WHERE competitor_id = ?1 AND call_id = ?2 AND area_id = ?3",
            rusqlite::params![competitor_str, call_str, area_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if duplicate {
          return Ok(Err(olymp_core::Error::DuplicateEnrollment {
            competitor_id,
            call_id,
            area_id,
          }));
        }

        let existing: i64 = tx.query_row(
          "SELECT COUNT(*) FROM enrollments WHERE competitor_id = ?1 AND call_id = ?2",
          rusqlite::params![competitor_str, call_str],
          |row| row.get(0),
        )?;
        if let Err(e) = check_area_cap(competitor_id, call_id, existing as usize) {
          return Ok(Err(e));
        }

        tx.execute(
          "INSERT INTO enrollments (
             enrollment_id, competitor_id, area_id, call_id, category_id,
             created_at, status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            enrollment_str,
            competitor_str,
            area_str,
            call_str,
            category_str,
            created_str,
            status_str,
          ],
        )?;

        for (link_id, tutor_id) in &links {
          tx.execute(
            "INSERT INTO tutor_decisions (link_id, enrollment_id, tutor_id, decision)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![link_id, enrollment_str, tutor_id, undecided],
          )?;
        }

        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;
    outcome?;

    tracing::debug!(
      enrollment_id = %enrollment.enrollment_id,
      links = decisions.len(),
      "enrollment inserted"
    );

    Ok(EnrollmentView { enrollment, decisions })
  }

  async fn record_decision(
    &self,
    input:  DecisionInput,
    policy: ConsensusPolicy,
  ) -> Result<DecisionOutcome> {
    let DecisionInput { enrollment_id, tutor_id, vote } = input;

    let enrollment_str = encode_uuid(enrollment_id);
    let tutor_str      = encode_uuid(tutor_id);
    let now_str        = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let link: Option<(String, String)> = tx
          .query_row(
            "SELECT link_id, decision FROM tutor_decisions
             WHERE enrollment_id = ?1 AND tutor_id = ?2",
            rusqlite::params![enrollment_str, tutor_str],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;
        let Some((link_id, current)) = link else {
          let enrollment_exists = tx
            .query_row(
              "SELECT 1 FROM enrollments WHERE enrollment_id = ?1",
              rusqlite::params![enrollment_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if !enrollment_exists {
            return Ok(Err(olymp_core::Error::EnrollmentNotFound(enrollment_id)));
          }
          return Ok(Err(olymp_core::Error::NoSuchLink { enrollment_id, tutor_id }));
        };
        if decode_decision(&current).map_err(in_call)? != DecisionState::Undecided {
          return Ok(Err(olymp_core::Error::AlreadyDecided { enrollment_id, tutor_id }));
        }

        let resolved = match vote.resolve() {
          Ok(resolved) => resolved,
          Err(e) => return Ok(Err(e)),
        };
        if let Some(reason_id) = resolved.reason_id {
          let known = tx
            .query_row(
              "SELECT 1 FROM rejection_reasons WHERE reason_id = ?1",
              rusqlite::params![reason_id],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if !known {
            return Ok(Err(olymp_core::Error::UnknownReason(reason_id)));
          }
        }

        tx.execute(
          "UPDATE tutor_decisions
           SET decision = ?1, decided_at = ?2, reason_id = ?3, elaboration = ?4
           WHERE link_id = ?5",
          rusqlite::params![
            resolved.decision.as_ref(),
            now_str,
            resolved.reason_id,
            resolved.elaboration,
            link_id,
          ],
        )?;

        // Re-read the whole set inside the same transaction.
        let states: Vec<String> = {
          let mut stmt = tx
            .prepare("SELECT decision FROM tutor_decisions WHERE enrollment_id = ?1")?;
          stmt
            .query_map(rusqlite::params![enrollment_str], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        let states = states
          .iter()
          .map(|s| decode_decision(s))
          .collect::<Result<Vec<_>>>()
          .map_err(in_call)?;
        let verdict = policy.evaluate(&states);

        let status: String = tx.query_row(
          "SELECT status FROM enrollments WHERE enrollment_id = ?1",
          rusqlite::params![enrollment_str],
          |row| row.get(0),
        )?;

        let transitioned = match verdict.target_status() {
          Some(target) if status == EnrollmentStatus::Pending.as_ref() => {
            tx.execute(
              "UPDATE enrollments SET status = ?1, status_changed_at = ?2
               WHERE enrollment_id = ?3",
              rusqlite::params![target.as_ref(), now_str, enrollment_str],
            )?;
            true
          }
          _ => false,
        };

        let enrollment = tx.query_row(
          &format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e WHERE e.enrollment_id = ?1"
          ),
          rusqlite::params![enrollment_str],
          |row| RawEnrollment::from_row(row, 0),
        )?;
        let decision = tx.query_row(
          &format!("SELECT {DECISION_COLUMNS} FROM tutor_decisions d WHERE d.link_id = ?1"),
          rusqlite::params![link_id],
          |row| RawDecision::from_row(row, 0),
        )?;

        tx.commit()?;
        Ok(Ok((enrollment, decision, verdict, transitioned)))
      })
      .await?;

    let (enrollment, decision, verdict, transitioned) = outcome?;

    Ok(DecisionOutcome {
      enrollment: enrollment.into_enrollment()?,
      decision: decision.into_decision()?,
      verdict,
      transitioned,
    })
  }

  async fn get_enrollment(&self, enrollment_id: Uuid) -> Result<Option<EnrollmentView>> {
    let id_str = encode_uuid(enrollment_id);

    let raw: Option<RawEnrollment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e WHERE e.enrollment_id = ?1"
              ),
              rusqlite::params![id_str],
              |row| RawEnrollment::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;

    let Some(raw) = raw else {
      return Ok(None);
    };
    let enrollment = raw.into_enrollment()?;
    Ok(self.with_decisions(vec![enrollment]).await?.pop())
  }

  async fn enrollments_for_competitor(
    &self,
    competitor_id: Uuid,
  ) -> Result<Vec<EnrollmentView>> {
    let id_str = encode_uuid(competitor_id);

    let raws: Vec<RawEnrollment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e
           WHERE e.competitor_id = ?1
           ORDER BY e.created_at DESC, e.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| RawEnrollment::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let enrollments = raws
      .into_iter()
      .map(RawEnrollment::into_enrollment)
      .collect::<Result<Vec<_>>>()?;
    self.with_decisions(enrollments).await
  }

  async fn pending_for_tutor(&self, tutor_id: Uuid) -> Result<Vec<Enrollment>> {
    let id_str    = encode_uuid(tutor_id);
    let undecided = DecisionState::Undecided.as_ref().to_owned();

    let raws: Vec<RawEnrollment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENROLLMENT_COLUMNS} FROM enrollments e
           JOIN tutor_decisions d ON d.enrollment_id = e.enrollment_id
           WHERE d.tutor_id = ?1 AND d.decision = ?2
           ORDER BY e.created_at, e.rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, undecided], |row| {
            RawEnrollment::from_row(row, 0)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEnrollment::into_enrollment).collect()
  }

  async fn assignments_for_tutor(&self, tutor_id: Uuid) -> Result<Vec<TutorAssignment>> {
    let id_str = encode_uuid(tutor_id);

    let raws: Vec<(RawEnrollment, RawDecision)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ENROLLMENT_COLUMNS}, {DECISION_COLUMNS} FROM enrollments e
           JOIN tutor_decisions d ON d.enrollment_id = e.enrollment_id
           WHERE d.tutor_id = ?1
           ORDER BY e.created_at DESC, e.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok((RawEnrollment::from_row(row, 0)?, RawDecision::from_row(row, 8)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(e, d)| {
        Ok(TutorAssignment {
          enrollment: e.into_enrollment()?,
          decision:   d.into_decision()?,
        })
      })
      .collect()
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn add_notification(&self, input: NewNotification) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      user_id:         input.user_id,
      kind:            input.kind,
      message:         input.message,
      created_at:      Utc::now(),
    };

    let id_str   = encode_uuid(notification.notification_id);
    let user_str = encode_uuid(notification.user_id);
    let kind_str = notification.kind.as_ref().to_owned();
    let message  = notification.message.clone();
    let at_str   = encode_dt(notification.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (notification_id, user_id, kind, message, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, user_str, kind_str, message, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(notification)
  }

  async fn notifications_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT notification_id, user_id, kind, message, created_at
           FROM notifications WHERE user_id = ?1
           ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawNotification {
              notification_id: row.get(0)?,
              user_id:         row.get(1)?,
              kind:            row.get(2)?,
              message:         row.get(3)?,
              created_at:      row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }
}
