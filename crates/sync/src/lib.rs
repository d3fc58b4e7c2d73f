//! Client-side reconciliation of the shared widget collection.
//!
//! The local collection changes from two independent sources: completions of
//! this client's own requests, and events other sessions push through the
//! event channel. This crate merges both into one consistent snapshot.
//!
//! # Components
//!
//! * [`Collection`]: ordered, id-unique widgets and the pure merge rules
//! * [`WidgetEngine`]: owns the collection; optimistic update with rollback,
//!   deferred create, confirmed delete, and remote event merging
//! * [`EventChannel`] and [`run_pump`]: decode transport frames into
//!   [`RemoteEvent`]s and route them to subscribed handlers
//! * [`ConnectionTracker`]: connecting/live/lost liveness of the channel
//! * [`EditForm`], [`Session`], [`Dashboard`]: the form, the explicitly
//!   constructed session and the mounted view that applies the error policy
//!
//! Mutations are "read current, compute next, replace" steps on a
//! [`tokio::sync::watch`] channel, applied in arrival order.

#![warn(missing_docs)]

pub mod channel;
pub mod collection;
pub mod connection;
pub mod engine;
pub mod error;
pub mod event;
pub mod form;
pub mod session;

pub use channel::{
	EventChannel, EventTransport, LocalBroadcaster, LocalTransport, Subscription, TransportEvent,
	run_pump,
};
pub use collection::Collection;
pub use connection::{ConnectionState, ConnectionTracker, Lifecycle};
pub use engine::WidgetEngine;
pub use error::{ChannelError, SyncError};
pub use event::{EventName, RemoteEvent};
pub use form::EditForm;
pub use session::{Dashboard, Flow, Route, Session, route_for};
