use std::sync::atomic::{AtomicUsize, Ordering};

use quorum_primitives::{Widget, WidgetId};
use serde_json::json;

use super::*;
use crate::connection::ConnectionState;

fn counter() -> (Arc<AtomicUsize>, impl Fn(&RemoteEvent) + Send + Sync + 'static) {
	let count = Arc::new(AtomicUsize::new(0));
	let seen = Arc::clone(&count);
	(count, move |_: &RemoteEvent| {
		seen.fetch_add(1, Ordering::SeqCst);
	})
}

#[test]
fn mount_unmount_cycles_leave_no_handlers() {
	let channel = EventChannel::new();
	for _ in 0..5 {
		let guards: Vec<Subscription> = EventName::ALL
			.into_iter()
			.map(|name| channel.subscribe(name, |_| {}))
			.collect();
		assert_eq!(channel.handler_count(), 3);
		drop(guards);
		assert_eq!(channel.handler_count(), 0);
	}
}

#[test]
fn resubscribing_replaces_handler() {
	let channel = EventChannel::new();
	let (first, first_handler) = counter();
	let (second, second_handler) = counter();

	let stale = channel.subscribe(EventName::Deleted, first_handler);
	let current = channel.subscribe(EventName::Deleted, second_handler);
	assert_eq!(channel.handler_count(), 1);

	drop(stale);
	assert!(channel.is_subscribed(EventName::Deleted));

	assert!(channel.dispatch("widget:deleted", json!("1")));
	assert_eq!(first.load(Ordering::SeqCst), 0);
	assert_eq!(second.load(Ordering::SeqCst), 1);

	drop(current);
	assert!(!channel.is_subscribed(EventName::Deleted));
}

#[test]
fn dispatch_delivers_once_to_matching_handler() {
	let channel = EventChannel::new();
	let (created, created_handler) = counter();
	let (updated, updated_handler) = counter();
	let _c = channel.subscribe(EventName::Created, created_handler);
	let _u = channel.subscribe(EventName::Updated, updated_handler);

	let payload = json!({"_id": "1", "title": "A", "description": "d", "type": "t"});
	assert!(channel.dispatch("widget:created", payload));
	assert_eq!(created.load(Ordering::SeqCst), 1);
	assert_eq!(updated.load(Ordering::SeqCst), 0);
}

#[test]
fn unknown_and_malformed_messages_are_dropped() {
	let channel = EventChannel::new();
	let (count, handler) = counter();
	let _s = channel.subscribe(EventName::Created, handler);

	assert!(!channel.dispatch("widget:archived", json!({})));
	assert!(!channel.dispatch("widget:created", json!({"title": "missing id"})));
	assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn explicit_unsubscribe_outlives_guard() {
	let channel = EventChannel::new();
	let guard = channel.subscribe(EventName::Updated, |_| {});
	assert!(channel.unsubscribe(EventName::Updated));
	assert!(!channel.unsubscribe(EventName::Updated));
	drop(guard);
	assert_eq!(channel.handler_count(), 0);
}

#[test]
fn handler_may_unsubscribe_itself() {
	let channel = EventChannel::new();
	let inner = channel.clone();
	let _s = channel.subscribe(EventName::Deleted, move |_| {
		inner.unsubscribe(EventName::Deleted);
	});
	assert!(channel.deliver(&RemoteEvent::Deleted(WidgetId::new("1"))));
	assert_eq!(channel.handler_count(), 0);
}

#[tokio::test]
async fn pump_routes_lifecycle_and_messages() {
	let transport = LocalTransport::new();
	let broadcaster = transport.broadcaster();
	let credential = Credential::parse("tok").unwrap();
	let frames = transport.connect(&credential).await.unwrap();

	let channel = EventChannel::new();
	let received = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&received);
	let _s = channel.subscribe(EventName::Updated, move |event| sink.lock().push(event.clone()));

	let tracker = ConnectionTracker::new();
	let widget = Widget::new("1", "A", "d", "t");
	assert!(broadcaster.open());
	assert!(broadcaster.emit(&RemoteEvent::Updated(widget.clone())));
	transport.disconnect().await;
	assert!(!broadcaster.open());

	run_pump(frames, channel, tracker.clone(), CancellationToken::new()).await;

	assert_eq!(*received.lock(), vec![RemoteEvent::Updated(widget)]);
	assert_eq!(tracker.state(), ConnectionState::Lost);
}

#[tokio::test]
async fn pump_stops_on_cancel_without_touching_tracker() {
	let transport = LocalTransport::new();
	let frames = transport
		.connect(&Credential::parse("tok").unwrap())
		.await
		.unwrap();
	let tracker = ConnectionTracker::new();
	tracker.observe(Lifecycle::Opened);

	let cancel = CancellationToken::new();
	cancel.cancel();
	run_pump(frames, EventChannel::new(), tracker.clone(), cancel).await;
	assert_eq!(tracker.state(), ConnectionState::Live);
}

#[tokio::test]
async fn data_events_leave_tracker_state_alone() {
	let cases = [
		(Lifecycle::Closed, ConnectionState::Lost),
		(Lifecycle::Opened, ConnectionState::Live),
	];
	for (lifecycle, expected) in cases {
		let tracker = ConnectionTracker::new();
		tracker.observe(lifecycle);

		let channel = EventChannel::new();
		let delivered = Arc::new(AtomicUsize::new(0));
		let _guards: Vec<Subscription> = EventName::ALL
			.into_iter()
			.map(|name| {
				let seen = Arc::clone(&delivered);
				channel.subscribe(name, move |_| {
					seen.fetch_add(1, Ordering::SeqCst);
				})
			})
			.collect();

		let (tx, rx) = mpsc::unbounded_channel();
		let record = json!({"_id": "1", "title": "A", "description": "d", "type": "t"});
		for (name, payload) in [
			(EventName::Created, record.clone()),
			(EventName::Updated, record),
			(EventName::Deleted, json!("1")),
		] {
			tx.send(TransportEvent::Message {
				name: name.as_str().to_string(),
				payload,
			})
			.unwrap();
		}

		// The sender stays open so the run ends by cancellation, never by
		// the stream closing.
		let cancel = CancellationToken::new();
		tokio::join!(
			run_pump(rx, channel.clone(), tracker.clone(), cancel.clone()),
			async {
				while delivered.load(Ordering::SeqCst) < 3 {
					tokio::task::yield_now().await;
				}
				cancel.cancel();
			},
		);

		assert_eq!(delivered.load(Ordering::SeqCst), 3);
		assert_eq!(tracker.state(), expected);
		drop(tx);
	}
}

#[tokio::test]
async fn local_transport_refuses_foreign_credentials() {
	let accepted = Credential::parse("good").unwrap();
	let transport = LocalTransport::accepting(accepted.clone());

	let refused = transport.connect(&Credential::parse("bad").unwrap()).await;
	assert!(matches!(refused, Err(ChannelError::Refused(_))));
	assert!(!transport.is_connected());

	transport.connect(&accepted).await.unwrap();
	assert!(transport.is_connected());
	assert_eq!(transport.connects().len(), 2);
}
