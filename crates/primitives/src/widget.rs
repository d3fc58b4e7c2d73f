use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::draft::WidgetDraft;

/// Server-assigned widget identity.
///
/// Opaque to the client: it is compared, displayed and echoed back in
/// request paths, never interpreted. Numeric identities on the wire are
/// normalized to their decimal text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WidgetId(pub String);

impl WidgetId {
	/// Creates an identity from its text form.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Returns the text form of the identity.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for WidgetId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for WidgetId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

impl From<String> for WidgetId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

impl<'de> Deserialize<'de> for WidgetId {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum RawId {
			Text(String),
			Unsigned(u64),
			Signed(i64),
		}

		Ok(match RawId::deserialize(deserializer)? {
			RawId::Text(text) => Self(text),
			RawId::Unsigned(n) => Self(n.to_string()),
			RawId::Signed(n) => Self(n.to_string()),
		})
	}
}

/// A widget record in its canonical, server-confirmed shape.
///
/// Decoding accepts the identity as `_id` or `id`; when a record carries
/// both, `_id` wins. Encoding always writes `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireWidget")]
pub struct Widget {
	/// Immutable identity assigned on creation.
	#[serde(rename = "_id")]
	pub id: WidgetId,
	/// Display title.
	pub title: String,
	/// Free text description.
	#[serde(default)]
	pub description: String,
	/// Free-form category tag.
	#[serde(rename = "type")]
	pub kind: String,
}

#[derive(Deserialize)]
struct WireWidget {
	#[serde(rename = "_id")]
	document_id: Option<WidgetId>,
	id: Option<WidgetId>,
	title: String,
	#[serde(default)]
	description: String,
	#[serde(rename = "type")]
	kind: String,
}

impl TryFrom<WireWidget> for Widget {
	type Error = String;

	fn try_from(wire: WireWidget) -> Result<Self, Self::Error> {
		let id = wire
			.document_id
			.or(wire.id)
			.ok_or_else(|| "missing field `_id`".to_string())?;
		Ok(Self {
			id,
			title: wire.title,
			description: wire.description,
			kind: wire.kind,
		})
	}
}

impl Widget {
	/// Creates a widget record.
	pub fn new(
		id: impl Into<WidgetId>,
		title: impl Into<String>,
		description: impl Into<String>,
		kind: impl Into<String>,
	) -> Self {
		Self {
			id: id.into(),
			title: title.into(),
			description: description.into(),
			kind: kind.into(),
		}
	}

	/// Returns a copy with the draft's fields merged over this record.
	///
	/// The identity is always preserved.
	pub fn with_draft(&self, draft: &WidgetDraft) -> Self {
		Self {
			id: self.id.clone(),
			title: draft.title.clone(),
			description: draft.description.clone(),
			kind: draft.kind.clone(),
		}
	}

	/// Returns the editable fields of this record as a draft.
	pub fn to_draft(&self) -> WidgetDraft {
		WidgetDraft {
			title: self.title.clone(),
			description: self.description.clone(),
			kind: self.kind.clone(),
		}
	}
}
