//! Durable notifications addressed to one user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

/// Type tag carried by a notification.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
pub enum NotificationKind {
  /// A tutor was asked to decide on a new enrollment.
  #[serde(rename = "solicitud")]
  #[strum(serialize = "solicitud")]
  Request,
  /// An enrollment changed status (or stalled on split decisions).
  #[serde(rename = "estado")]
  #[strum(serialize = "estado")]
  Status,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub user_id:         Uuid,
  pub kind:            NotificationKind,
  pub message:         String,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::OlympiadStore::add_notification`].
#[derive(Debug, Clone)]
pub struct NewNotification {
  pub user_id: Uuid,
  pub kind:    NotificationKind,
  pub message: String,
}

impl Notification {
  /// The JSON payload pushed to a live channel.
  pub fn payload(&self) -> serde_json::Value {
    serde_json::json!({
      "notification_id": self.notification_id,
      "kind":            self.kind,
      "message":         self.message,
      "created_at":      self.created_at,
    })
  }
}
