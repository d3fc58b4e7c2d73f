//! Edit form state: the draft fields, the selected widget and inline
//! validation messages.

use std::collections::HashMap;

use quorum_primitives::{Field, ValidationError, Widget, WidgetDraft, WidgetId};

/// State behind the create/edit form.
///
/// With no selection a submit creates a widget; with a selection it updates
/// that widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditForm {
	/// Title input.
	pub title: String,
	/// Description input.
	pub description: String,
	/// Type input.
	pub kind: String,
	selected: Option<WidgetId>,
	errors: HashMap<Field, &'static str>,
}

impl EditForm {
	/// Creates an empty form in create mode.
	pub fn new() -> Self {
		Self::default()
	}

	/// Selects `widget` for editing and pre-fills the inputs from it.
	pub fn begin_edit(&mut self, widget: &Widget) {
		self.title = widget.title.clone();
		self.description = widget.description.clone();
		self.kind = widget.kind.clone();
		self.selected = Some(widget.id.clone());
		self.errors.clear();
	}

	/// Widget being edited, if any.
	pub fn selected(&self) -> Option<&WidgetId> {
		self.selected.as_ref()
	}

	/// Returns true in edit mode.
	pub fn is_editing(&self) -> bool {
		self.selected.is_some()
	}

	/// Current inputs as a draft.
	pub fn draft(&self) -> WidgetDraft {
		WidgetDraft::new(&self.title, &self.description, &self.kind)
	}

	/// Sets one input and clears its validation message.
	pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
		let value = value.into();
		match field {
			Field::Title => self.title = value,
			Field::Description => self.description = value,
			Field::Type => self.kind = value,
		}
		self.errors.remove(&field);
	}

	/// Inline message for `field`, if it failed validation.
	pub fn error(&self, field: Field) -> Option<&'static str> {
		self.errors.get(&field).copied()
	}

	/// Returns true if any field carries a message.
	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}

	/// Replaces the inline messages with those of `err`.
	pub fn record_errors(&mut self, err: &ValidationError) {
		self.errors = err
			.missing()
			.iter()
			.map(|field| (*field, field.required_message()))
			.collect();
	}

	/// Clears every inline message.
	pub fn clear_errors(&mut self) {
		self.errors.clear();
	}

	/// Clears the inputs, the selection and the messages.
	pub fn reset(&mut self) {
		*self = Self::default();
	}
}
