//! Liveness of the event channel.
//!
//! The tracker is driven only by transport lifecycle notifications. Data
//! events never touch it.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Tri-state liveness indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
	/// A connection attempt (first or reconnect) is in progress.
	#[default]
	Connecting,
	/// The channel is open and delivering events.
	Live,
	/// The channel closed.
	Lost,
}

impl ConnectionState {
	/// Label shown next to the indicator.
	pub const fn label(self) -> &'static str {
		match self {
			Self::Connecting => "connecting",
			Self::Live => "live",
			Self::Lost => "lost",
		}
	}

	/// Indicator colour.
	pub const fn indicator_color(self) -> &'static str {
		match self {
			Self::Connecting => "orange",
			Self::Live => "green",
			Self::Lost => "red",
		}
	}
}

impl fmt::Display for ConnectionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Lifecycle notification raised by a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
	/// A connection or reconnection attempt started.
	Connecting,
	/// The channel opened.
	Opened,
	/// The channel closed.
	Closed,
	/// A reconnection attempt succeeded.
	Reconnected,
}

impl Lifecycle {
	/// State this notification moves the tracker to.
	pub const fn target(self) -> ConnectionState {
		match self {
			Self::Connecting => ConnectionState::Connecting,
			Self::Opened | Self::Reconnected => ConnectionState::Live,
			Self::Closed => ConnectionState::Lost,
		}
	}
}

/// Publishes the latest [`ConnectionState`].
///
/// Cloning yields another handle to the same state. Observers see only the
/// most recent value; intermediate states are never queued.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
	state: Arc<watch::Sender<ConnectionState>>,
}

impl ConnectionTracker {
	/// Creates a tracker in the `Connecting` state.
	pub fn new() -> Self {
		let (state, _) = watch::channel(ConnectionState::Connecting);
		Self {
			state: Arc::new(state),
		}
	}

	/// Applies a lifecycle notification.
	pub fn observe(&self, event: Lifecycle) {
		let next = event.target();
		let previous = self.state.send_replace(next);
		if previous != next {
			tracing::debug!(from = %previous, to = %next, ?event, "connection state changed");
		}
	}

	/// Current state.
	pub fn state(&self) -> ConnectionState {
		*self.state.borrow()
	}

	/// Watches state changes.
	pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
		self.state.subscribe()
	}
}

impl Default for ConnectionTracker {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn starts_connecting() {
		let tracker = ConnectionTracker::new();
		assert_eq!(tracker.state(), ConnectionState::Connecting);
		assert_eq!(tracker.state().indicator_color(), "orange");
	}

	#[test]
	fn follows_lifecycle_notifications() {
		let tracker = ConnectionTracker::new();
		let steps = [
			(Lifecycle::Opened, ConnectionState::Live),
			(Lifecycle::Closed, ConnectionState::Lost),
			(Lifecycle::Connecting, ConnectionState::Connecting),
			(Lifecycle::Reconnected, ConnectionState::Live),
		];
		for (event, expected) in steps {
			tracker.observe(event);
			assert_eq!(tracker.state(), expected, "after {event:?}");
		}
	}

	#[test]
	fn reflects_only_latest_notification() {
		let tracker = ConnectionTracker::new();
		let mut rx = tracker.subscribe();
		tracker.observe(Lifecycle::Opened);
		tracker.observe(Lifecycle::Closed);
		assert!(rx.has_changed().unwrap());
		assert_eq!(*rx.borrow_and_update(), ConnectionState::Lost);
		assert!(!rx.has_changed().unwrap());
	}

	#[test]
	fn clones_share_state() {
		let tracker = ConnectionTracker::new();
		tracker.clone().observe(Lifecycle::Opened);
		assert_eq!(tracker.state(), ConnectionState::Live);
		assert_eq!(tracker.state().to_string(), "live");
	}
}
