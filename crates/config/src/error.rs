//! Error types for configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or an unknown key.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// An endpoint is not a valid absolute URL.
	#[error("invalid URL for {key}: {value} ({reason})")]
	InvalidUrl {
		/// Config key holding the URL.
		key: &'static str,
		/// The rejected value.
		value: String,
		/// Parser diagnostic.
		reason: url::ParseError,
	},

	/// An endpoint uses a scheme the client cannot speak.
	#[error("unsupported scheme for {key}: {scheme}")]
	UnsupportedScheme {
		/// Config key holding the URL.
		key: &'static str,
		/// The rejected scheme.
		scheme: String,
	},

	/// Requests must have a finite, non-zero timeout.
	#[error("request timeout must be at least one second")]
	ZeroTimeout,
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
