//! Enrollment approval workflow for olympiad registrations.
//!
//! Ties the pure rules of [`olymp_core`] to any [`OlympiadStore`]:
//!
//! - [`resolver`] finds the call currently accepting registrations for an
//!   area.
//! - [`lifecycle`] creates enrollments and records tutor decisions, moving
//!   each enrollment through `Pending → {Accepted, Rejected}`.
//! - [`dispatcher`] persists notifications and pushes them to live
//!   channels held by a [`channel::ChannelRegistry`].
//!
//! [`OlympiadStore`]: olymp_core::store::OlympiadStore

pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod lifecycle;
pub mod resolver;

pub use channel::{ChannelRegistry, PushChannel, PushEvent};
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use lifecycle::EnrollmentWorkflow;
