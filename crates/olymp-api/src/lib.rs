//! JSON HTTP API for the olympiad enrollment workflow.
//!
//! Exposes an axum [`Router`] backed by any [`OlympiadStore`]. Callers are
//! identified by headers set by a trusted gateway; see [`identity`].
//!
//! | Method | Path | Role |
//! |--------|------|------|
//! | `POST` | `/enrollments` | competitor |
//! | `POST` | `/enrollments/{id}/approve` | tutor |
//! | `POST` | `/enrollments/{id}/reject` | tutor |
//! | `GET`  | `/enrollments/mine` | competitor |
//! | `GET`  | `/calls/{id}/available-areas` | competitor |
//! | `GET`  | `/tutor/pending` | tutor |
//! | `GET`  | `/tutor/assignments` | tutor |
//! | `GET`  | `/rejection-reasons` | anyone |
//! | `GET`  | `/notifications` | any identified caller |
//! | `GET`  | `/events` | any identified caller (server-sent events) |

pub mod catalog;
pub mod enrollments;
pub mod error;
pub mod events;
pub mod extract;
pub mod identity;
pub mod notifications;
pub mod seed;
pub mod tutor;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use olymp_core::{consensus::ConsensusPolicy, store::OlympiadStore};
use olymp_workflow::{ChannelRegistry, EnrollmentWorkflow};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `OLYMP_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  #[serde(default)]
  pub consensus_policy: ConsensusPolicy,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub workflow: EnrollmentWorkflow<S>,
  pub channels: Arc<ChannelRegistry>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { workflow: self.workflow.clone(), channels: self.channels.clone() }
  }
}

impl<S: OlympiadStore> AppState<S> {
  pub fn new(store: Arc<S>, policy: ConsensusPolicy) -> Self {
    let channels = Arc::new(ChannelRegistry::new());
    let workflow = EnrollmentWorkflow::new(store, channels.clone(), policy);
    Self { workflow, channels }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: OlympiadStore + 'static,
{
  Router::new()
    // Enrollments
    .route("/enrollments",                  post(enrollments::create::<S>))
    .route("/enrollments/mine",             get(enrollments::mine::<S>))
    .route("/enrollments/{id}/approve",     post(enrollments::approve::<S>))
    .route("/enrollments/{id}/reject",      post(enrollments::reject::<S>))
    // Catalog
    .route("/calls/{id}/available-areas",   get(catalog::available_areas::<S>))
    .route("/rejection-reasons",            get(catalog::rejection_reasons::<S>))
    // Tutors
    .route("/tutor/pending",                get(tutor::pending::<S>))
    .route("/tutor/assignments",            get(tutor::assignments::<S>))
    // Notifications
    .route("/notifications",                get(notifications::list::<S>))
    .route("/events",                       get(events::subscribe::<S>))
    .with_state(state)
}
