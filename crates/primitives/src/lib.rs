//! Shared data model for the widget dashboard: records, identities and drafts.

/// Draft fields and client-side validation.
pub mod draft;
/// Widget records and server-assigned identities.
pub mod widget;

pub use draft::{Field, ValidationError, WidgetDraft};
pub use widget::{Widget, WidgetId};
