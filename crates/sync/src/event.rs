//! Remote-origin change events.

use std::fmt;

use quorum_primitives::{Widget, WidgetId};
use serde::Deserialize;
use serde_json::Value;

/// Named push events carrying widget changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
	/// `widget:created`, carrying a full widget.
	Created,
	/// `widget:updated`, carrying a full widget.
	Updated,
	/// `widget:deleted`, carrying a bare identity.
	Deleted,
}

impl EventName {
	/// Every widget event, in subscription order.
	pub const ALL: [EventName; 3] = [EventName::Created, EventName::Updated, EventName::Deleted];

	/// Wire name of the event.
	pub const fn as_str(self) -> &'static str {
		match self {
			EventName::Created => "widget:created",
			EventName::Updated => "widget:updated",
			EventName::Deleted => "widget:deleted",
		}
	}

	/// Parses a wire name. Unknown names yield `None`.
	pub fn parse(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|event| event.as_str() == name)
	}
}

impl fmt::Display for EventName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A decoded push event, delivered to the engine as a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
	/// Another session created a widget.
	Created(Widget),
	/// Another session updated a widget.
	Updated(Widget),
	/// Another session deleted a widget.
	Deleted(WidgetId),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeletedPayload {
	Bare(WidgetId),
	Record {
		#[serde(rename = "_id")]
		document_id: Option<WidgetId>,
		id: Option<WidgetId>,
	},
}

impl RemoteEvent {
	/// Decodes the payload of a named event.
	///
	/// `deleted` accepts either a bare identity or an object carrying `_id`
	/// (or `id`; `_id` wins when both are present).
	pub fn decode(name: EventName, payload: Value) -> Result<Self, serde_json::Error> {
		Ok(match name {
			EventName::Created => Self::Created(serde_json::from_value(payload)?),
			EventName::Updated => Self::Updated(serde_json::from_value(payload)?),
			EventName::Deleted => match serde_json::from_value(payload)? {
				DeletedPayload::Bare(id) => Self::Deleted(id),
				DeletedPayload::Record { document_id, id } => Self::Deleted(
					document_id
						.or(id)
						.ok_or_else(|| <serde_json::Error as serde::de::Error>::missing_field("_id"))?,
				),
			},
		})
	}

	/// Encodes the event as it appears on the wire.
	pub fn encode(&self) -> (EventName, Value) {
		let payload = match self {
			Self::Created(widget) | Self::Updated(widget) => {
				serde_json::to_value(widget).unwrap_or(Value::Null)
			}
			Self::Deleted(id) => Value::String(id.to_string()),
		};
		(self.name(), payload)
	}

	/// Name of the event.
	pub fn name(&self) -> EventName {
		match self {
			Self::Created(_) => EventName::Created,
			Self::Updated(_) => EventName::Updated,
			Self::Deleted(_) => EventName::Deleted,
		}
	}

	/// Identity of the affected widget.
	pub fn id(&self) -> &WidgetId {
		match self {
			Self::Created(widget) | Self::Updated(widget) => &widget.id,
			Self::Deleted(id) => id,
		}
	}
}
