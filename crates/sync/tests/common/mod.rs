#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use quorum_client::{ApiError, WidgetApi};
use quorum_primitives::{Widget, WidgetDraft, WidgetId};
use tokio::sync::Notify;
use tokio::time::{sleep, timeout};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	List,
	Create(WidgetDraft),
	Update(WidgetId, WidgetDraft),
	Delete(WidgetId),
}

/// Scripted request client.
///
/// Records every call, serves `list` from a fixed set, assigns `srv-N`
/// identities on create and echoes drafts back on update. Failures queued
/// with [`fail`](Self::fail) are returned, one per call and in order, by the
/// next calls of that operation.
/// While [`hold`](Self::hold) is active, calls record themselves and then
/// wait for the returned gate before completing.
#[derive(Default)]
pub struct ScriptedApi {
	calls: Mutex<Vec<Call>>,
	listed: Mutex<Vec<Widget>>,
	failures: Mutex<HashMap<&'static str, VecDeque<ApiError>>>,
	gate: Mutex<Option<Arc<Notify>>>,
	next_id: AtomicUsize,
}

impl ScriptedApi {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn with_widgets(widgets: Vec<Widget>) -> Arc<Self> {
		let api = Self::new();
		*api.listed.lock() = widgets;
		api
	}

	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().clone()
	}

	pub fn fail(&self, op: &'static str, err: ApiError) {
		self.failures.lock().entry(op).or_default().push_back(err);
	}

	/// Makes subsequent calls wait until the returned gate is notified.
	pub fn hold(&self) -> Arc<Notify> {
		let gate = Arc::new(Notify::new());
		*self.gate.lock() = Some(Arc::clone(&gate));
		gate
	}

	pub fn release(&self) {
		self.gate.lock().take();
	}

	async fn enter(&self, op: &'static str, call: Call) -> Result<(), ApiError> {
		self.calls.lock().push(call);
		let gate = self.gate.lock().clone();
		if let Some(gate) = gate {
			gate.notified().await;
		}
		match self.failures.lock().get_mut(op).and_then(VecDeque::pop_front) {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}
}

#[async_trait]
impl WidgetApi for ScriptedApi {
	async fn list(&self) -> Result<Vec<Widget>, ApiError> {
		self.enter("list", Call::List).await?;
		Ok(self.listed.lock().clone())
	}

	async fn create(&self, draft: &WidgetDraft) -> Result<Widget, ApiError> {
		self.enter("create", Call::Create(draft.clone())).await?;
		let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
		Ok(Widget::new(
			format!("srv-{n}"),
			&draft.title,
			&draft.description,
			&draft.kind,
		))
	}

	async fn update(&self, id: &WidgetId, draft: &WidgetDraft) -> Result<Widget, ApiError> {
		self.enter("update", Call::Update(id.clone(), draft.clone()))
			.await?;
		Ok(Widget::new(
			id.clone(),
			&draft.title,
			&draft.description,
			&draft.kind,
		))
	}

	async fn delete(&self, id: &WidgetId) -> Result<(), ApiError> {
		self.enter("delete", Call::Delete(id.clone())).await
	}
}

pub async fn wait_until<F>(name: &str, mut condition: F)
where
	F: FnMut() -> bool,
{
	timeout(Duration::from_secs(2), async move {
		loop {
			if condition() {
				return;
			}
			sleep(Duration::from_millis(10)).await;
		}
	})
	.await
	.unwrap_or_else(|_| panic!("timed out waiting for {name}"));
}

pub fn widget(id: &str, title: &str) -> Widget {
	Widget::new(id, title, "desc", "chart")
}
