//! In-process transport.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use quorum_client::Credential;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{EventTransport, TransportEvent};
use crate::connection::Lifecycle;
use crate::error::ChannelError;
use crate::event::RemoteEvent;

#[derive(Default)]
struct LocalState {
	sender: Option<mpsc::UnboundedSender<TransportEvent>>,
	accept: Option<Credential>,
	connects: Vec<Credential>,
}

/// [`EventTransport`] backed by an in-memory queue.
///
/// Frames are injected through a [`LocalBroadcaster`]. Each `connect` opens
/// a fresh stream and emits a `Connecting` lifecycle frame; the broadcaster
/// decides when the channel opens, drops or recovers.
#[derive(Clone, Default)]
pub struct LocalTransport {
	state: Arc<Mutex<LocalState>>,
}

impl LocalTransport {
	/// Creates a transport that accepts any credential.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a transport that refuses every credential except `credential`.
	pub fn accepting(credential: Credential) -> Self {
		let transport = Self::default();
		transport.state.lock().accept = Some(credential);
		transport
	}

	/// Handle that emits frames into the current stream.
	pub fn broadcaster(&self) -> LocalBroadcaster {
		LocalBroadcaster {
			state: Arc::clone(&self.state),
		}
	}

	/// Returns true while a stream is open.
	pub fn is_connected(&self) -> bool {
		self.state
			.lock()
			.sender
			.as_ref()
			.is_some_and(|sender| !sender.is_closed())
	}

	/// Credentials presented to `connect`, oldest first.
	pub fn connects(&self) -> Vec<Credential> {
		self.state.lock().connects.clone()
	}
}

#[async_trait]
impl EventTransport for LocalTransport {
	async fn connect(
		&self,
		credential: &Credential,
	) -> Result<mpsc::UnboundedReceiver<TransportEvent>, ChannelError> {
		let mut state = self.state.lock();
		state.connects.push(credential.clone());
		if state.accept.as_ref().is_some_and(|accepted| accepted != credential) {
			return Err(ChannelError::Refused("credential rejected".into()));
		}

		let (tx, rx) = mpsc::unbounded_channel();
		let _ = tx.send(TransportEvent::Lifecycle(Lifecycle::Connecting));
		state.sender = Some(tx);
		Ok(rx)
	}

	async fn disconnect(&self) {
		self.state.lock().sender = None;
	}
}

/// Emits frames into a [`LocalTransport`]'s open stream.
///
/// Every method returns false when no stream is open.
#[derive(Clone)]
pub struct LocalBroadcaster {
	state: Arc<Mutex<LocalState>>,
}

impl LocalBroadcaster {
	fn send(&self, frame: TransportEvent) -> bool {
		self.state
			.lock()
			.sender
			.as_ref()
			.is_some_and(|sender| sender.send(frame).is_ok())
	}

	/// The channel opened.
	pub fn open(&self) -> bool {
		self.send(TransportEvent::Lifecycle(Lifecycle::Opened))
	}

	/// The channel dropped.
	pub fn close(&self) -> bool {
		self.send(TransportEvent::Lifecycle(Lifecycle::Closed))
	}

	/// A reconnection attempt started.
	pub fn reconnecting(&self) -> bool {
		self.send(TransportEvent::Lifecycle(Lifecycle::Connecting))
	}

	/// A reconnection attempt succeeded.
	pub fn reconnected(&self) -> bool {
		self.send(TransportEvent::Lifecycle(Lifecycle::Reconnected))
	}

	/// Broadcasts a widget event in its wire form.
	pub fn emit(&self, event: &RemoteEvent) -> bool {
		let (name, payload) = event.encode();
		self.emit_raw(name.as_str(), payload)
	}

	/// Broadcasts an arbitrary named message.
	pub fn emit_raw(&self, name: &str, payload: Value) -> bool {
		self.send(TransportEvent::Message {
			name: name.to_string(),
			payload,
		})
	}
}
