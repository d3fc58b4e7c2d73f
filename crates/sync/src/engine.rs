//! Reconciliation engine: the single owner of the local widget collection.
//!
//! Two sources mutate the collection: completions of this client's own
//! requests and remote events pushed by the channel. Both funnel through
//! [`WidgetEngine`], and each mutation is one closure passed to the watch
//! sender, so every step reads the current collection and replaces it
//! atomically. Completions and events are applied in the order they arrive.
//!
//! Update is optimistic: the entry is rewritten before the request resolves
//! and rolled back if the request fails. Create is deferred until the server
//! assigns an id. Delete is applied only once the server confirms.
//!
//! Overlapping updates of one id share a single rollback target: the last
//! value the server confirmed, either by answering an update or by pushing
//! an event. It is restored only when the last pending update for that id
//! fails and the entry still shows the newest optimistic edit.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use quorum_client::WidgetApi;
use quorum_primitives::{Widget, WidgetDraft, WidgetId};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::collection::Collection;
use crate::error::SyncError;
use crate::event::RemoteEvent;

/// Owns the local collection and reconciles it with the server.
///
/// Cloning yields another handle to the same collection, so a clone can be
/// moved into an event handler while the view keeps issuing mutations.
#[derive(Clone)]
pub struct WidgetEngine {
	api: Arc<dyn WidgetApi>,
	state: Arc<watch::Sender<Collection>>,
	/// Ids with updates in flight. Only touched while the watch sender is
	/// being modified, so the two never disagree.
	in_flight: Arc<Mutex<HashMap<WidgetId, InFlight>>>,
}

/// Bookkeeping for the updates of one id that have not resolved yet.
#[derive(Debug)]
struct InFlight {
	/// Last server-confirmed value; `None` once a deletion was confirmed.
	confirmed: Option<Widget>,
	/// Newest optimistic value written for this id.
	optimistic: Option<Widget>,
	pending: usize,
}

impl WidgetEngine {
	/// Creates an engine with an empty collection.
	pub fn new(api: Arc<dyn WidgetApi>) -> Self {
		let (state, _) = watch::channel(Collection::new());
		Self {
			api,
			state: Arc::new(state),
			in_flight: Arc::default(),
		}
	}

	/// Copy of the current collection.
	pub fn snapshot(&self) -> Collection {
		self.state.borrow().clone()
	}

	/// Current value of a single widget.
	pub fn get(&self, id: &WidgetId) -> Option<Widget> {
		self.state.borrow().get(id).cloned()
	}

	/// Watches the collection. The receiver is marked changed after every
	/// mutation that altered it.
	pub fn subscribe(&self) -> watch::Receiver<Collection> {
		self.state.subscribe()
	}

	/// Replaces the whole collection with a full fetch.
	///
	/// On failure the collection is left as it was. There is no retry.
	pub async fn load_all(&self) -> Result<Collection, SyncError> {
		let widgets = self.api.list().await.map_err(SyncError::fetch)?;
		let loaded: Collection = widgets.into_iter().collect();
		debug!(count = loaded.len(), "loaded widgets");
		self.state.send_modify(|collection| {
			*collection = loaded.clone();
			for (id, entry) in self.in_flight.lock().iter_mut() {
				entry.confirmed = collection.get(id).cloned();
			}
		});
		Ok(loaded)
	}

	/// Creates a widget, or updates `selected` with the draft fields.
	///
	/// The draft is validated first; a [`SyncError::Validation`] means no
	/// request was made and nothing changed. Returns the canonical record.
	pub async fn create_or_update(
		&self,
		draft: &WidgetDraft,
		selected: Option<&WidgetId>,
	) -> Result<Widget, SyncError> {
		draft.validate()?;
		match selected {
			None => self.create(draft).await,
			Some(id) => self.update(id, draft).await,
		}
	}

	async fn create(&self, draft: &WidgetDraft) -> Result<Widget, SyncError> {
		let widget = self.api.create(draft).await.map_err(SyncError::create)?;
		let appended = self
			.state
			.send_if_modified(|collection| collection.insert_if_absent(widget.clone()));
		debug!(id = %widget.id, appended, "create confirmed");
		Ok(widget)
	}

	async fn update(&self, id: &WidgetId, draft: &WidgetDraft) -> Result<Widget, SyncError> {
		self.state.send_if_modified(|collection| {
			let current = collection.get(id).cloned();
			let mut in_flight = self.in_flight.lock();
			let entry = in_flight.entry(id.clone()).or_insert_with(|| InFlight {
				confirmed: current.clone(),
				optimistic: None,
				pending: 0,
			});
			entry.pending += 1;

			let Some(current) = current else {
				return false;
			};
			let optimistic = current.with_draft(draft);
			let changed = optimistic != current;
			if changed {
				collection.replace(optimistic.clone());
			}
			entry.optimistic = Some(optimistic);
			changed
		});

		// A dropped request settles like a failed one.
		let mut guard = PendingUpdate {
			engine: self,
			id,
			armed: true,
		};
		let result = self.api.update(id, draft).await;
		guard.armed = false;

		match result {
			Ok(widget) => {
				self.state.send_if_modified(|collection| {
					let mut in_flight = self.in_flight.lock();
					let settled = match in_flight.get_mut(id) {
						Some(entry) => {
							entry.pending = entry.pending.saturating_sub(1);
							entry.confirmed = Some(widget.clone());
							entry.pending == 0
						}
						None => false,
					};
					if settled {
						in_flight.remove(id);
					}
					collection.upsert(widget.clone()).as_ref() != Some(&widget)
				});
				debug!(%id, "update confirmed");
				Ok(widget)
			}
			Err(err) => {
				self.roll_back(id);
				Err(SyncError::update(id.clone(), err))
			}
		}
	}

	/// Settles a failed update of `id`.
	///
	/// While another update of the same id is pending nothing is restored.
	/// Once the last one fails, the confirmed value is restored if the entry
	/// still holds the newest optimistic edit; a newer remote update or a
	/// remote deletion wins over the rollback.
	fn roll_back(&self, id: &WidgetId) {
		let mut outcome = Rollback::Superseded;
		self.state.send_if_modified(|collection| {
			let mut in_flight = self.in_flight.lock();
			let Some(entry) = in_flight.get_mut(id) else {
				return false;
			};
			entry.pending = entry.pending.saturating_sub(1);
			if entry.pending > 0 {
				outcome = Rollback::Deferred;
				return false;
			}
			let Some(entry) = in_flight.remove(id) else {
				return false;
			};
			let (Some(confirmed), Some(optimistic)) = (entry.confirmed, entry.optimistic) else {
				return false;
			};
			if collection.get(id) != Some(&optimistic) {
				return false;
			}
			outcome = Rollback::Restored;
			if confirmed == optimistic {
				return false;
			}
			collection.replace(confirmed);
			true
		});
		match outcome {
			Rollback::Restored => warn!(%id, "update failed, edit rolled back"),
			Rollback::Deferred => warn!(%id, "update failed, another update still pending"),
			Rollback::Superseded => warn!(%id, "update failed, entry already superseded"),
		}
	}

	/// Deletes a widget. The entry is removed only after the server confirms.
	pub async fn remove(&self, id: &WidgetId) -> Result<(), SyncError> {
		self.api
			.delete(id)
			.await
			.map_err(|err| SyncError::delete(id.clone(), err))?;
		let removed = self.state.send_if_modified(|collection| collection.remove(id).is_some());
		debug!(%id, removed, "delete confirmed");
		Ok(())
	}

	/// Merges a remote event. Returns true if the collection changed.
	///
	/// Synchronous: a remote event never waits on a request.
	pub fn apply_remote_event(&self, event: &RemoteEvent) -> bool {
		let changed = self.state.send_if_modified(|collection| {
			let changed = collection.apply(event);
			if let Some(entry) = self.in_flight.lock().get_mut(event.id()) {
				match event {
					RemoteEvent::Created(widget) if changed => {
						entry.confirmed = Some(widget.clone());
					}
					RemoteEvent::Created(_) => {}
					RemoteEvent::Updated(widget) => entry.confirmed = Some(widget.clone()),
					RemoteEvent::Deleted(_) => entry.confirmed = None,
				}
			}
			changed
		});
		debug!(event = %event.name(), id = %event.id(), changed, "remote event merged");
		changed
	}
}

enum Rollback {
	Restored,
	Deferred,
	Superseded,
}

struct PendingUpdate<'a> {
	engine: &'a WidgetEngine,
	id: &'a WidgetId,
	armed: bool,
}

impl Drop for PendingUpdate<'_> {
	fn drop(&mut self) {
		if self.armed {
			self.engine.roll_back(self.id);
		}
	}
}
