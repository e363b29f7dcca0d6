//! `GET /events`: live notification push over server-sent events.
//!
//! Opening the stream registers the caller in the [`ChannelRegistry`];
//! dropping it (client disconnect) unregisters that same channel. A newer
//! connection by the same user takes over the push channel.

use std::{convert::Infallible, sync::Arc};

use axum::{
  extract::State,
  response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, stream};
use olymp_core::store::OlympiadStore;
use olymp_workflow::{ChannelRegistry, channel::ChannelId};
use uuid::Uuid;

use crate::{AppState, identity::Caller};

/// Unregisters the channel when the response stream is dropped.
struct Registration {
  channels:   Arc<ChannelRegistry>,
  user_id:    Uuid,
  channel_id: ChannelId,
}

impl Drop for Registration {
  fn drop(&mut self) {
    self.channels.unregister(self.user_id, self.channel_id);
  }
}

pub async fn subscribe<S>(
  State(state): State<AppState<S>>,
  caller: Caller,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
  S: OlympiadStore,
{
  let user_id = caller.subject_id;
  let (channel_id, rx) = state.channels.register(user_id);
  let registration = Registration { channels: state.channels.clone(), user_id, channel_id };

  let events = stream::unfold((rx, registration), |(mut rx, registration)| async move {
    let push = rx.recv().await?;
    let event = Event::default()
      .event(push.event)
      .data(push.payload.to_string());
    Some((Ok(event), (rx, registration)))
  });

  Sse::new(events).keep_alive(KeepAlive::default())
}
