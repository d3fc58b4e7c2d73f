//! The local widget collection and its merge rules.
//!
//! [`Collection`] is pure data: every method is a synchronous
//! "read current, compute next" step. The engine wraps each call in a single
//! replace of the published snapshot, so the merge rules here can be tested
//! without any channel or runtime.

use indexmap::IndexMap;
use quorum_primitives::{Widget, WidgetId};

use crate::event::RemoteEvent;

/// Ordered widgets, unique by id.
///
/// Insertion order is display order. Replacing an entry keeps its position;
/// removing one preserves the order of the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
	entries: IndexMap<WidgetId, Widget>,
}

impl Collection {
	/// Creates an empty collection.
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of widgets.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true if there are no widgets.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Looks up a widget by id.
	pub fn get(&self, id: &WidgetId) -> Option<&Widget> {
		self.entries.get(id)
	}

	/// Returns true if a widget with `id` is present.
	pub fn contains(&self, id: &WidgetId) -> bool {
		self.entries.contains_key(id)
	}

	/// Widgets in display order.
	pub fn iter(&self) -> impl Iterator<Item = &Widget> {
		self.entries.values()
	}

	/// Copies the widgets out in display order.
	pub fn to_vec(&self) -> Vec<Widget> {
		self.iter().cloned().collect()
	}

	/// Appends `widget` unless its id is already present.
	///
	/// Returns true if the widget was appended.
	pub fn insert_if_absent(&mut self, widget: Widget) -> bool {
		if self.entries.contains_key(&widget.id) {
			return false;
		}
		self.entries.insert(widget.id.clone(), widget);
		true
	}

	/// Replaces the entry with the same id in place, or appends it.
	///
	/// Returns the replaced entry.
	pub fn upsert(&mut self, widget: Widget) -> Option<Widget> {
		self.entries.insert(widget.id.clone(), widget)
	}

	/// Replaces the entry with the same id in place. Absent ids are ignored.
	///
	/// Returns the replaced entry.
	pub fn replace(&mut self, widget: Widget) -> Option<Widget> {
		let slot = self.entries.get_mut(&widget.id)?;
		Some(std::mem::replace(slot, widget))
	}

	/// Removes the entry with `id`, keeping the order of the rest.
	pub fn remove(&mut self, id: &WidgetId) -> Option<Widget> {
		self.entries.shift_remove(id)
	}

	/// Merges a remote event. Returns true if the collection changed.
	///
	/// * `Created` appends unless the id exists, so duplicate delivery and the
	///   echo of this client's own create are harmless.
	/// * `Updated` replaces in place, appending when the id is missing.
	/// * `Deleted` removes the id, and is a no-op when it is absent.
	///
	/// Events win by arrival order; there is no version comparison.
	pub fn apply(&mut self, event: &RemoteEvent) -> bool {
		match event {
			RemoteEvent::Created(widget) => self.insert_if_absent(widget.clone()),
			RemoteEvent::Updated(widget) => {
				self.upsert(widget.clone()).as_ref() != Some(widget)
			}
			RemoteEvent::Deleted(id) => self.remove(id).is_some(),
		}
	}
}

impl FromIterator<Widget> for Collection {
	/// Builds a collection, keeping the last record for a repeated id at the
	/// position of its first occurrence.
	fn from_iter<I: IntoIterator<Item = Widget>>(iter: I) -> Self {
		let mut collection = Self::new();
		for widget in iter {
			collection.upsert(widget);
		}
		collection
	}
}

impl<'a> IntoIterator for &'a Collection {
	type Item = &'a Widget;
	type IntoIter = indexmap::map::Values<'a, WidgetId, Widget>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.values()
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn widget(id: &str, title: &str) -> Widget {
		Widget::new(id, title, "d", "t")
	}

	fn ids(collection: &Collection) -> Vec<&str> {
		collection.iter().map(|w| w.id.as_str()).collect()
	}

	#[test]
	fn created_is_idempotent() {
		let mut once = Collection::new();
		once.apply(&RemoteEvent::Created(widget("1", "A")));

		let mut twice = once.clone();
		assert!(!twice.apply(&RemoteEvent::Created(widget("1", "A"))));
		assert_eq!(twice.to_vec(), once.to_vec());
	}

	#[test]
	fn created_does_not_clobber_existing_entry() {
		let mut collection: Collection = [widget("1", "local")].into_iter().collect();
		collection.apply(&RemoteEvent::Created(widget("1", "remote")));
		assert_eq!(collection.get(&WidgetId::new("1")).unwrap().title, "local");
	}

	#[test]
	fn deleted_is_idempotent() {
		let mut collection: Collection = [widget("1", "A"), widget("2", "B")].into_iter().collect();
		let event = RemoteEvent::Deleted(WidgetId::new("1"));
		assert!(collection.apply(&event));
		let after_once = collection.clone();
		assert!(!collection.apply(&event));
		assert_eq!(collection, after_once);
		assert_eq!(ids(&collection), vec!["2"]);
	}

	#[test]
	fn updated_appends_missing_entry() {
		let mut collection: Collection = [widget("1", "A")].into_iter().collect();
		assert!(collection.apply(&RemoteEvent::Updated(widget("2", "B"))));
		assert_eq!(ids(&collection), vec!["1", "2"]);
	}

	#[test]
	fn updated_replaces_in_place() {
		let mut collection: Collection =
			[widget("1", "A"), widget("2", "B"), widget("3", "C")].into_iter().collect();
		collection.apply(&RemoteEvent::Updated(widget("2", "B2")));
		assert_eq!(ids(&collection), vec!["1", "2", "3"]);
		assert_eq!(collection.get(&WidgetId::new("2")).unwrap().title, "B2");
	}

	#[test]
	fn identical_update_reports_no_change() {
		let mut collection: Collection = [widget("1", "A")].into_iter().collect();
		assert!(!collection.apply(&RemoteEvent::Updated(widget("1", "A"))));
	}

	#[test]
	fn create_update_delete_sequence_leaves_nothing() {
		let mut collection = Collection::new();
		collection.apply(&RemoteEvent::Created(widget("A", "v1")));
		collection.apply(&RemoteEvent::Updated(widget("A", "v2")));
		collection.apply(&RemoteEvent::Deleted(WidgetId::new("A")));
		assert!(!collection.contains(&WidgetId::new("A")));
		assert!(collection.is_empty());
	}

	#[test]
	fn deleted_then_updated_revives_record() {
		let mut collection: Collection = [Widget::new("1", "A", "d", "t")].into_iter().collect();

		collection.apply(&RemoteEvent::Deleted(WidgetId::new("1")));
		assert!(collection.is_empty());

		collection.apply(&RemoteEvent::Updated(Widget::new("1", "A2", "d2", "t2")));
		assert_eq!(collection.to_vec(), vec![Widget::new("1", "A2", "d2", "t2")]);
	}

	#[test]
	fn removal_preserves_order_of_remaining() {
		let mut collection: Collection =
			[widget("1", "A"), widget("2", "B"), widget("3", "C")].into_iter().collect();
		collection.remove(&WidgetId::new("2"));
		assert_eq!(ids(&collection), vec!["1", "3"]);
	}

	#[test]
	fn replace_ignores_missing_ids() {
		let mut collection = Collection::new();
		assert_eq!(collection.replace(widget("1", "A")), None);
		assert!(collection.is_empty());
	}

	#[test]
	fn duplicate_ids_in_fetch_collapse() {
		let collection: Collection = [widget("1", "old"), widget("2", "B"), widget("1", "new")]
			.into_iter()
			.collect();
		assert_eq!(ids(&collection), vec!["1", "2"]);
		assert_eq!(collection.get(&WidgetId::new("1")).unwrap().title, "new");
	}
}
