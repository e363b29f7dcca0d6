//! Notification dispatch: persist first, then push.

use std::sync::Arc;

use olymp_core::{
  notification::{NewNotification, Notification, NotificationKind},
  store::OlympiadStore,
};
use uuid::Uuid;

use crate::{Error, Result, channel::PushChannel};

/// Event name carried by every notification push.
pub const NOTIFICATION_EVENT: &str = "notification:new";

pub struct Dispatcher<S> {
  store:    Arc<S>,
  channels: Arc<dyn PushChannel>,
}

impl<S> Clone for Dispatcher<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), channels: self.channels.clone() }
  }
}

impl<S: OlympiadStore> Dispatcher<S> {
  pub fn new(store: Arc<S>, channels: Arc<dyn PushChannel>) -> Self {
    Self { store, channels }
  }

  /// Persist a notification for `user_id`, then push it if the user holds a
  /// live channel. A missing channel is not an error; the stored record is
  /// available through [`OlympiadStore::notifications_for_user`].
  pub async fn notify(
    &self,
    user_id: Uuid,
    kind: NotificationKind,
    message: impl Into<String>,
  ) -> Result<Notification> {
    let notification = self
      .store
      .add_notification(NewNotification { user_id, kind, message: message.into() })
      .await
      .map_err(Error::from_store)?;

    let delivered =
      self
        .channels
        .push(user_id, NOTIFICATION_EVENT, &notification.payload());
    tracing::debug!(
      %user_id,
      notification_id = %notification.notification_id,
      kind = notification.kind.as_ref(),
      delivered,
      "notification dispatched"
    );

    Ok(notification)
  }
}
