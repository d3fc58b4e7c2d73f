//! Event channel adapter.
//!
//! A transport delivers [`TransportEvent`] frames: lifecycle notifications
//! and named messages. [`run_pump`] routes lifecycle frames to the
//! [`ConnectionTracker`] and messages to an [`EventChannel`], which decodes
//! them into [`RemoteEvent`]s and hands each one to the handler subscribed to
//! its name.
//!
//! The channel holds at most one handler per event name. Subscriptions are
//! RAII guards, so a view that subscribes on mount and drops its guards on
//! unmount never leaves handlers behind.

mod local;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
pub use local::{LocalBroadcaster, LocalTransport};
use parking_lot::Mutex;
use quorum_client::Credential;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::connection::{ConnectionTracker, Lifecycle};
use crate::error::ChannelError;
use crate::event::{EventName, RemoteEvent};

/// Frame produced by a push transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
	/// Connection lifecycle change.
	Lifecycle(Lifecycle),
	/// Named message with a raw JSON payload.
	Message {
		/// Wire event name, e.g. `widget:updated`.
		name: String,
		/// Undecoded payload.
		payload: Value,
	},
}

/// A bidirectional push transport.
///
/// Reconnection is the transport's concern; it surfaces only as lifecycle
/// frames on the returned stream. The stream ends when the transport is
/// disconnected.
#[async_trait]
pub trait EventTransport: Send + Sync {
	/// Opens the channel with `credential` attached.
	async fn connect(
		&self,
		credential: &Credential,
	) -> Result<mpsc::UnboundedReceiver<TransportEvent>, ChannelError>;

	/// Closes the channel and ends its stream.
	async fn disconnect(&self);
}

type Handler = Arc<dyn Fn(&RemoteEvent) + Send + Sync>;

struct Slot {
	token: u64,
	handler: Handler,
}

#[derive(Default)]
struct Inner {
	slots: Mutex<HashMap<EventName, Slot>>,
	next_token: AtomicU64,
}

/// Per-name handler table for decoded remote events.
///
/// Cheap to clone; clones share the table.
#[derive(Clone, Default)]
pub struct EventChannel {
	inner: Arc<Inner>,
}

impl EventChannel {
	/// Creates a channel with no handlers.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the handler for `name`, replacing any previous one.
	///
	/// The handler stays installed until the returned guard is dropped or
	/// [`unsubscribe`](Self::unsubscribe) is called.
	pub fn subscribe(
		&self,
		name: EventName,
		handler: impl Fn(&RemoteEvent) + Send + Sync + 'static,
	) -> Subscription {
		let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
		let slot = Slot {
			token,
			handler: Arc::new(handler),
		};
		if self.inner.slots.lock().insert(name, slot).is_some() {
			tracing::warn!(event = %name, "replaced existing handler");
		}
		Subscription {
			inner: Arc::downgrade(&self.inner),
			name,
			token,
		}
	}

	/// Removes the handler for `name`. Returns true if one was installed.
	pub fn unsubscribe(&self, name: EventName) -> bool {
		self.inner.slots.lock().remove(&name).is_some()
	}

	/// Returns true if a handler is installed for `name`.
	pub fn is_subscribed(&self, name: EventName) -> bool {
		self.inner.slots.lock().contains_key(&name)
	}

	/// Number of installed handlers.
	pub fn handler_count(&self) -> usize {
		self.inner.slots.lock().len()
	}

	/// Decodes a raw message and delivers it.
	///
	/// Unknown names are ignored; undecodable payloads are logged and dropped.
	/// Returns true if a handler received the event.
	pub fn dispatch(&self, name: &str, payload: Value) -> bool {
		let Some(event_name) = EventName::parse(name) else {
			tracing::trace!(event = name, "ignoring unknown event");
			return false;
		};
		match RemoteEvent::decode(event_name, payload) {
			Ok(event) => self.deliver(&event),
			Err(err) => {
				tracing::warn!(event = name, error = %err, "dropping malformed event");
				false
			}
		}
	}

	/// Hands an already decoded event to its handler.
	pub fn deliver(&self, event: &RemoteEvent) -> bool {
		// Handlers run outside the lock so they may subscribe or unsubscribe.
		let handler = self
			.inner
			.slots
			.lock()
			.get(&event.name())
			.map(|slot| Arc::clone(&slot.handler));
		match handler {
			Some(handler) => {
				handler(event);
				true
			}
			None => false,
		}
	}
}

/// Guard for an installed handler; dropping it removes the handler.
///
/// If a newer subscription replaced the handler for the same name, dropping
/// the stale guard leaves the newer handler in place.
#[must_use = "dropping a Subscription immediately removes its handler"]
pub struct Subscription {
	inner: Weak<Inner>,
	name: EventName,
	token: u64,
}

impl Subscription {
	/// Event name this guard covers.
	pub fn name(&self) -> EventName {
		self.name
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("name", &self.name)
			.field("token", &self.token)
			.finish()
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		let Some(inner) = self.inner.upgrade() else {
			return;
		};
		let mut slots = inner.slots.lock();
		if slots.get(&self.name).is_some_and(|slot| slot.token == self.token) {
			slots.remove(&self.name);
		}
	}
}

/// Drives a transport stream until it ends or `cancel` fires.
///
/// Lifecycle frames update `tracker`; messages go to `channel`. The end of
/// the stream is reported to the tracker as a close.
pub async fn run_pump(
	mut frames: mpsc::UnboundedReceiver<TransportEvent>,
	channel: EventChannel,
	tracker: ConnectionTracker,
	cancel: CancellationToken,
) {
	loop {
		tokio::select! {
			biased;
			() = cancel.cancelled() => {
				tracing::debug!("event pump cancelled");
				return;
			}
			frame = frames.recv() => match frame {
				Some(TransportEvent::Lifecycle(event)) => tracker.observe(event),
				Some(TransportEvent::Message { name, payload }) => {
					channel.dispatch(&name, payload);
				}
				None => {
					tracing::debug!("transport stream ended");
					tracker.observe(Lifecycle::Closed);
					return;
				}
			},
		}
	}
}
