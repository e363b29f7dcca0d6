//! Live delivery channels.
//!
//! A [`ChannelRegistry`] maps each connected user to the sending half of an
//! unbounded queue. The transport layer registers a user when a push
//! connection opens, drains the receiver, and unregisters on disconnect.
//! Only the most recent connection of a user receives pushes.

use std::{
  collections::HashMap,
  sync::{
    PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
  },
};

use tokio::sync::mpsc;
use uuid::Uuid;

/// One event delivered over a live channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PushEvent {
  pub event:   String,
  pub payload: serde_json::Value,
}

/// Best-effort push to a user's live channel.
pub trait PushChannel: Send + Sync {
  /// Returns `false` when the user has no open channel or it has gone away.
  fn push(&self, user_id: Uuid, event: &str, payload: &serde_json::Value) -> bool;
}

/// Identifies one registration, so that a stale connection cannot remove
/// its successor.
pub type ChannelId = u64;

type Entry = (ChannelId, mpsc::UnboundedSender<PushEvent>);

#[derive(Default)]
pub struct ChannelRegistry {
  next_id:  AtomicU64,
  channels: RwLock<HashMap<Uuid, Entry>>,
}

impl ChannelRegistry {
  pub fn new() -> Self { Self::default() }

  /// Open a channel for `user_id`, replacing any previous one.
  pub fn register(
    &self,
    user_id: Uuid,
  ) -> (ChannelId, mpsc::UnboundedReceiver<PushEvent>) {
    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
    let (tx, rx) = mpsc::unbounded_channel();

    let mut channels =
      self.channels.write().unwrap_or_else(PoisonError::into_inner);
    channels.insert(user_id, (id, tx));
    tracing::debug!(%user_id, channel_id = id, "push channel registered");

    (id, rx)
  }

  /// Remove the channel of `user_id` if it is still `channel_id`.
  pub fn unregister(&self, user_id: Uuid, channel_id: ChannelId) -> bool {
    let mut channels =
      self.channels.write().unwrap_or_else(PoisonError::into_inner);
    match channels.get(&user_id) {
      Some((current, _)) if *current == channel_id => {
        channels.remove(&user_id);
        tracing::debug!(%user_id, channel_id, "push channel unregistered");
        true
      }
      _ => false,
    }
  }

  pub fn lookup(&self, user_id: Uuid) -> Option<mpsc::UnboundedSender<PushEvent>> {
    self
      .channels
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .get(&user_id)
      .map(|(_, tx)| tx.clone())
  }

  /// Number of users with an open channel.
  pub fn connected(&self) -> usize {
    self.channels.read().unwrap_or_else(PoisonError::into_inner).len()
  }
}

impl PushChannel for ChannelRegistry {
  fn push(&self, user_id: Uuid, event: &str, payload: &serde_json::Value) -> bool {
    let Some(tx) = self.lookup(user_id) else {
      return false;
    };
    tx.send(PushEvent { event: event.to_owned(), payload: payload.clone() })
      .is_ok()
  }
}
