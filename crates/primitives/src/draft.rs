use std::fmt;

use serde::{Deserialize, Serialize};

/// Editable widget fields, as submitted by the edit form.
///
/// This is also the request body of create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetDraft {
	/// Display title.
	pub title: String,
	/// Free text description.
	pub description: String,
	/// Free-form category tag.
	#[serde(rename = "type")]
	pub kind: String,
}

impl WidgetDraft {
	/// Creates a draft from its three fields.
	pub fn new(
		title: impl Into<String>,
		description: impl Into<String>,
		kind: impl Into<String>,
	) -> Self {
		Self {
			title: title.into(),
			description: description.into(),
			kind: kind.into(),
		}
	}

	/// Returns the value of a single field.
	pub fn value(&self, field: Field) -> &str {
		match field {
			Field::Title => &self.title,
			Field::Description => &self.description,
			Field::Type => &self.kind,
		}
	}

	/// Checks that every field is non-empty.
	///
	/// All missing fields are reported at once so the form can flag each of
	/// them next to its input.
	pub fn validate(&self) -> Result<(), ValidationError> {
		let missing: Vec<Field> = Field::ALL
			.into_iter()
			.filter(|field| self.value(*field).is_empty())
			.collect();

		if missing.is_empty() {
			Ok(())
		} else {
			Err(ValidationError { missing })
		}
	}
}

/// A draft field subject to validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
	/// The `title` field.
	Title,
	/// The `description` field.
	Description,
	/// The `type` field.
	Type,
}

impl Field {
	/// All fields in form order.
	pub const ALL: [Field; 3] = [Field::Title, Field::Description, Field::Type];

	/// Wire name of the field.
	pub const fn name(self) -> &'static str {
		match self {
			Field::Title => "title",
			Field::Description => "description",
			Field::Type => "type",
		}
	}

	/// Inline message shown next to an empty field.
	pub const fn required_message(self) -> &'static str {
		match self {
			Field::Title => "Title is required",
			Field::Description => "Description is required",
			Field::Type => "Type is required",
		}
	}
}

impl fmt::Display for Field {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// One or more draft fields were empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing required fields: {}", .missing.iter().map(|f| f.name()).collect::<Vec<_>>().join(", "))]
pub struct ValidationError {
	missing: Vec<Field>,
}

impl ValidationError {
	/// Fields that failed validation, in form order.
	pub fn missing(&self) -> &[Field] {
		&self.missing
	}

	/// Returns true if `field` failed validation.
	pub fn contains(&self, field: Field) -> bool {
		self.missing.contains(&field)
	}
}
