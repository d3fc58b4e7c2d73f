//! Session lifecycle and the mounted dashboard.
//!
//! A [`Session`] is built explicitly from a credential, a request client and
//! a push transport; nothing is global. It connects the channel, runs the
//! event pump and owns the engine and tracker until [`Session::shutdown`].
//!
//! A [`Dashboard`] is the view on top of a session: while it exists the
//! three widget events are routed to the engine, and every operation result
//! is settled into form errors, the banner, or a redirect to authentication.

use std::sync::Arc;

use quorum_client::{Credential, CredentialStore, WidgetApi};
use quorum_primitives::WidgetId;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::channel::{EventChannel, EventTransport, Subscription, run_pump};
use crate::collection::Collection;
use crate::connection::{ConnectionState, ConnectionTracker, Lifecycle};
use crate::engine::WidgetEngine;
use crate::error::SyncError;
use crate::event::EventName;
use crate::form::EditForm;

/// Top-level screen selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
	/// Login/registration.
	Authentication,
	/// The widget dashboard.
	Dashboard,
}

/// The dashboard is reachable only with a credential.
pub fn route_for(credential: Option<&Credential>) -> Route {
	match credential {
		Some(_) => Route::Dashboard,
		None => Route::Authentication,
	}
}

/// A signed-in session: engine, tracker and the running event pump.
pub struct Session {
	credential: Credential,
	engine: WidgetEngine,
	channel: EventChannel,
	tracker: ConnectionTracker,
	transport: Arc<dyn EventTransport>,
	cancel: CancellationToken,
	pump: Option<JoinHandle<()>>,
}

impl Session {
	/// Connects the event channel and starts routing its frames.
	///
	/// A channel that cannot be established leaves the tracker `Lost`; the
	/// request side of the session still works.
	pub async fn start(
		credential: Credential,
		api: Arc<dyn WidgetApi>,
		transport: Arc<dyn EventTransport>,
	) -> Self {
		let engine = WidgetEngine::new(api);
		let channel = EventChannel::new();
		let tracker = ConnectionTracker::new();
		let cancel = CancellationToken::new();

		let pump = match transport.connect(&credential).await {
			Ok(frames) => Some(tokio::spawn(run_pump(
				frames,
				channel.clone(),
				tracker.clone(),
				cancel.clone(),
			))),
			Err(err) => {
				tracing::warn!(error = %err, "event channel unavailable");
				tracker.observe(Lifecycle::Closed);
				None
			}
		};

		Self {
			credential,
			engine,
			channel,
			tracker,
			transport,
			cancel,
			pump,
		}
	}

	/// Credential attached to this session.
	pub fn credential(&self) -> &Credential {
		&self.credential
	}

	/// The reconciliation engine.
	pub fn engine(&self) -> &WidgetEngine {
		&self.engine
	}

	/// Handler table fed by the pump.
	pub fn channel(&self) -> &EventChannel {
		&self.channel
	}

	/// Liveness of the event channel.
	pub fn tracker(&self) -> &ConnectionTracker {
		&self.tracker
	}

	/// Current liveness of the event channel.
	pub fn connection_state(&self) -> ConnectionState {
		self.tracker.state()
	}

	/// Mounts a dashboard view on this session.
	pub fn dashboard(&self, store: Arc<dyn CredentialStore>) -> Dashboard {
		Dashboard::mount(self.engine.clone(), &self.channel, store)
	}

	/// Stops the pump and disconnects the transport.
	pub async fn shutdown(mut self) {
		self.cancel.cancel();
		self.transport.disconnect().await;
		if let Some(pump) = self.pump.take()
			&& let Err(err) = pump.await
		{
			tracing::warn!(error = %err, "event pump task failed");
		}
		tracing::debug!("session shut down");
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		self.cancel.cancel();
	}
}

/// What the caller should show after an operation settles.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
	/// Remain on the dashboard.
	Stay,
	/// The credential was rejected and cleared; show authentication.
	Authenticate,
}

/// The mounted dashboard view.
///
/// Holds the widget event subscriptions for as long as it lives, the edit
/// form, and a single dismissible error banner.
pub struct Dashboard {
	engine: WidgetEngine,
	store: Arc<dyn CredentialStore>,
	form: EditForm,
	banner: Option<&'static str>,
	loading: bool,
	_subscriptions: Vec<Subscription>,
}

impl Dashboard {
	/// Subscribes the widget events on `channel` to `engine`.
	pub fn mount(
		engine: WidgetEngine,
		channel: &EventChannel,
		store: Arc<dyn CredentialStore>,
	) -> Self {
		let subscriptions = EventName::ALL
			.into_iter()
			.map(|name| {
				let engine = engine.clone();
				channel.subscribe(name, move |event| {
					engine.apply_remote_event(event);
				})
			})
			.collect();

		Self {
			engine,
			store,
			form: EditForm::new(),
			banner: None,
			loading: false,
			_subscriptions: subscriptions,
		}
	}

	/// Widgets to render.
	pub fn widgets(&self) -> Collection {
		self.engine.snapshot()
	}

	/// The edit form.
	pub fn form(&self) -> &EditForm {
		&self.form
	}

	/// The edit form, for input.
	pub fn form_mut(&mut self) -> &mut EditForm {
		&mut self.form
	}

	/// Error banner text, if shown.
	pub fn banner(&self) -> Option<&'static str> {
		self.banner
	}

	/// Hides the banner.
	pub fn dismiss_banner(&mut self) {
		self.banner = None;
	}

	/// Returns true while the initial fetch is running.
	pub fn is_loading(&self) -> bool {
		self.loading
	}

	/// Runs the full fetch.
	pub async fn load(&mut self) -> Flow {
		self.loading = true;
		let result = self.engine.load_all().await;
		self.loading = false;
		self.settle(result.map(drop))
	}

	/// Selects a widget for editing. Returns false if it is not present.
	pub fn edit(&mut self, id: &WidgetId) -> bool {
		match self.engine.get(id) {
			Some(widget) => {
				self.form.begin_edit(&widget);
				true
			}
			None => false,
		}
	}

	/// Submits the form as a create or an update.
	///
	/// Validation failures stay in the form as inline messages. Any remote
	/// outcome resets the form.
	pub async fn submit(&mut self) -> Flow {
		let draft = self.form.draft();
		let selected = self.form.selected().cloned();
		let result = self
			.engine
			.create_or_update(&draft, selected.as_ref())
			.await;

		match &result {
			Err(SyncError::Validation(err)) => self.form.record_errors(err),
			_ => self.form.reset(),
		}
		self.settle(result.map(drop))
	}

	/// Deletes a widget. Deleting the widget being edited resets the form.
	pub async fn delete(&mut self, id: &WidgetId) -> Flow {
		let result = self.engine.remove(id).await;
		if result.is_ok() && self.form.selected() == Some(id) {
			self.form.reset();
		}
		self.settle(result)
	}

	fn settle(&mut self, result: Result<(), SyncError>) -> Flow {
		let err = match result {
			Ok(()) => return Flow::Stay,
			Err(SyncError::Validation(_)) => return Flow::Stay,
			Err(err) => err,
		};

		if err.is_auth() {
			tracing::warn!(error = %err, "credential rejected, signing out");
			if let Err(clear) = self.store.clear() {
				tracing::warn!(error = %clear, "failed to clear credential");
			}
			return Flow::Authenticate;
		}

		tracing::warn!(error = %err, "widget operation failed");
		self.banner = Some(err.user_message());
		Flow::Stay
	}
}
