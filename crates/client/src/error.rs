//! Error types for remote calls and credential storage.

use std::path::PathBuf;

use thiserror::Error;

/// Longest server-provided message kept in [`ApiError::Rejected`].
const MAX_MESSAGE_LEN: usize = 200;

/// Normalized outcome of a failed remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
	/// The credential is missing, expired or invalid (401/403).
	#[error("credential rejected (status {status})")]
	Unauthorized {
		/// HTTP status code.
		status: u16,
	},
	/// Any other non-success response.
	#[error("request rejected (status {status}): {message}")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Server-provided reason, if any.
		message: String,
	},
	/// The request did not complete within the configured timeout.
	#[error("request timed out")]
	Timeout,
	/// Connection, TLS or request construction failure.
	#[error("network error: {0}")]
	Transport(String),
	/// The response body did not match the expected shape.
	#[error("invalid response: {0}")]
	Decode(String),
}

impl ApiError {
	/// Returns true if the failure means the credential must be discarded.
	pub fn is_auth(&self) -> bool {
		matches!(self, Self::Unauthorized { .. })
	}

	/// Classifies a non-success status and its body.
	pub fn from_status(status: u16, body: &str) -> Self {
		match status {
			401 | 403 => Self::Unauthorized { status },
			_ => Self::Rejected {
				status,
				message: extract_message(body),
			},
		}
	}

	pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			Self::Timeout
		} else if err.is_decode() {
			Self::Decode(err.to_string())
		} else if let Some(status) = err.status() {
			Self::from_status(status.as_u16(), "")
		} else {
			Self::Transport(err.to_string())
		}
	}
}

/// Pulls a human-readable reason out of an error body.
///
/// The backend answers with `{"message": ...}` or `{"error": ...}`; anything
/// else is passed through as trimmed text.
fn extract_message(body: &str) -> String {
	let from_json = serde_json::from_str::<serde_json::Value>(body)
		.ok()
		.and_then(|v| {
			v.get("message")
				.and_then(|m| m.as_str())
				.or_else(|| v.get("error")?.as_str())
				.map(str::to_owned)
		});

	let message = from_json.unwrap_or_else(|| body.trim().to_string());
	match message.char_indices().nth(MAX_MESSAGE_LEN) {
		Some((cut, _)) => format!("{}...", &message[..cut]),
		None => message,
	}
}

/// Errors from durable credential storage.
#[derive(Debug, Error)]
pub enum CredentialError {
	/// Reading, writing or removing the credential file failed.
	#[error("I/O error on credential file {path}: {error}")]
	Io {
		/// Path of the credential file.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
	/// The platform exposes no data directory and no path was configured.
	#[error("no data directory available for credential storage")]
	NoDataDir,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unauthorized_statuses_are_auth_failures() {
		assert!(ApiError::from_status(401, "").is_auth());
		assert!(ApiError::from_status(403, "{\"message\":\"forbidden\"}").is_auth());
		assert!(!ApiError::from_status(500, "").is_auth());
		assert!(!ApiError::Timeout.is_auth());
	}

	#[test]
	fn rejected_message_prefers_json_fields() {
		assert_eq!(
			ApiError::from_status(404, r#"{"message":"Widget not found"}"#),
			ApiError::Rejected {
				status: 404,
				message: "Widget not found".into()
			}
		);
		assert_eq!(
			ApiError::from_status(400, r#"{"error":"bad payload"}"#),
			ApiError::Rejected {
				status: 400,
				message: "bad payload".into()
			}
		);
	}

	#[test]
	fn rejected_message_falls_back_to_text() {
		let err = ApiError::from_status(502, "  Bad Gateway \n");
		assert_eq!(err.to_string(), "request rejected (status 502): Bad Gateway");
	}

	#[test]
	fn long_messages_are_truncated() {
		let body = "x".repeat(500);
		let ApiError::Rejected { message, .. } = ApiError::from_status(500, &body) else {
			panic!("expected rejection");
		};
		assert_eq!(message.len(), MAX_MESSAGE_LEN + 3);
		assert!(message.ends_with("..."));
	}
}
