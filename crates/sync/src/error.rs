//! Error types for engine operations and the event channel.

use quorum_client::ApiError;
use quorum_primitives::{ValidationError, WidgetId};
use thiserror::Error;

/// Failure of a reconciliation engine operation.
///
/// Any [`ApiError::Unauthorized`] becomes [`SyncError::Auth`] regardless of
/// the operation that hit it, so callers need a single check to redirect to
/// authentication.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
	/// The draft had empty fields. Nothing was sent or mutated.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// The full fetch failed; the collection is unchanged.
	#[error("failed to load widgets: {0}")]
	Fetch(#[source] ApiError),
	/// The create request failed; nothing was appended.
	#[error("failed to create widget: {0}")]
	Create(#[source] ApiError),
	/// The update request failed; the optimistic edit was rolled back.
	#[error("failed to update widget {id}: {source}")]
	Update {
		/// Widget whose update failed.
		id: WidgetId,
		/// Underlying request failure.
		source: ApiError,
	},
	/// The delete request failed; the entry is still present.
	#[error("failed to delete widget {id}: {source}")]
	Delete {
		/// Widget whose deletion failed.
		id: WidgetId,
		/// Underlying request failure.
		source: ApiError,
	},
	/// The credential was rejected; it must be discarded.
	#[error("not authorized: {0}")]
	Auth(#[source] ApiError),
}

impl SyncError {
	pub(crate) fn fetch(err: ApiError) -> Self {
		Self::or_auth(err, Self::Fetch)
	}

	pub(crate) fn create(err: ApiError) -> Self {
		Self::or_auth(err, Self::Create)
	}

	pub(crate) fn update(id: WidgetId, err: ApiError) -> Self {
		Self::or_auth(err, |source| Self::Update { id, source })
	}

	pub(crate) fn delete(id: WidgetId, err: ApiError) -> Self {
		Self::or_auth(err, |source| Self::Delete { id, source })
	}

	fn or_auth(err: ApiError, wrap: impl FnOnce(ApiError) -> Self) -> Self {
		if err.is_auth() {
			Self::Auth(err)
		} else {
			wrap(err)
		}
	}

	/// Returns true if the stored credential must be cleared.
	pub fn is_auth(&self) -> bool {
		matches!(self, Self::Auth(_))
	}

	/// Short text for the dashboard banner.
	pub fn user_message(&self) -> &'static str {
		match self {
			Self::Validation(_) => "Please fill in all fields",
			Self::Fetch(_) => "Failed to load widgets",
			Self::Create(_) => "Failed to create widget",
			Self::Update { .. } => "Failed to update widget",
			Self::Delete { .. } => "Failed to delete widget",
			Self::Auth(_) => "Your session has expired, please log in again",
		}
	}
}

/// Failure to establish the event channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
	/// The transport refused the connection, typically over the credential.
	#[error("channel refused: {0}")]
	Refused(String),
	/// The transport is closed or unreachable.
	#[error("channel unavailable")]
	Unavailable,
}
