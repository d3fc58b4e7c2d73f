//! Configuration for the Quorum client.
//!
//! Endpoint locations are never compiled into the client; they come from a
//! TOML file, falling back to the defaults below when no file exists.
//!
//! # Configuration Files
//!
//! Quorum looks for configuration in these locations (in order):
//!
//! 1. The path passed with `--config`
//! 2. `$XDG_CONFIG_HOME/quorum/config.toml` (or the platform equivalent)
//! 3. Built-in defaults
//!
//! # Schema
//!
//! ```toml
//! [endpoints]
//! api = "https://collaborative-dashboard-backend.onrender.com/api"
//! channel = "https://collaborative-dashboard-backend.onrender.com/"
//!
//! [request]
//! timeout-secs = 30
//!
//! [storage]
//! credential-path = "/home/me/.local/share/quorum/credential"
//!
//! [log]
//! level = "info"
//! ```
//!
//! Every section and key is optional.

pub mod error;

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use error::{ConfigError, Result};
use serde::Deserialize;
use url::Url;

/// Default REST base URL.
pub const DEFAULT_API_URL: &str = "https://collaborative-dashboard-backend.onrender.com/api";
/// Default push channel URL.
pub const DEFAULT_CHANNEL_URL: &str = "https://collaborative-dashboard-backend.onrender.com/";
/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Validated client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// Base URL of the REST collection resource.
	pub api_url: Url,
	/// URL of the push event channel.
	///
	/// Reserved for an `EventTransport` implementation; the terminal client
	/// only speaks the request side and never connects to it.
	pub channel_url: Url,
	/// Finite timeout applied to every request.
	pub request_timeout: Duration,
	/// Override for where the session credential is persisted.
	pub credential_path: Option<PathBuf>,
	/// Default log verbosity.
	pub log_level: LogLevel,
}

/// Log verbosity selectable from the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	/// Errors only.
	Error,
	/// Warnings and errors.
	Warn,
	/// Informational messages.
	#[default]
	Info,
	/// Debug diagnostics.
	Debug,
	/// Everything.
	Trace,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
	endpoints: RawEndpoints,
	request: RawRequest,
	storage: RawStorage,
	log: RawLog,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawEndpoints {
	api: Option<String>,
	channel: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
struct RawRequest {
	timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
struct RawStorage {
	credential_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawLog {
	level: Option<LogLevel>,
}

impl Config {
	/// Parse a TOML string into a validated [`Config`].
	pub fn parse(input: &str) -> Result<Self> {
		let raw: RawConfig = toml::from_str(input)?;
		Self::from_raw(raw)
	}

	/// Load configuration from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}

	/// Load from `explicit` if given, else from [`Config::default_path`] if
	/// that file exists, else return the defaults.
	///
	/// An explicit path that cannot be read is an error; a missing default
	/// file is not.
	pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
		if let Some(path) = explicit {
			return Self::load(path);
		}
		match Self::default_path() {
			Some(path) if path.is_file() => Self::load(path),
			_ => Self::from_raw(RawConfig::default()),
		}
	}

	/// Platform location of the user config file.
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join("quorum").join("config.toml"))
	}

	fn from_raw(raw: RawConfig) -> Result<Self> {
		let api_url = parse_endpoint(
			"endpoints.api",
			raw.endpoints.api.as_deref().unwrap_or(DEFAULT_API_URL),
			&["http", "https"],
		)?;
		let channel_url = parse_endpoint(
			"endpoints.channel",
			raw.endpoints.channel.as_deref().unwrap_or(DEFAULT_CHANNEL_URL),
			&["http", "https", "ws", "wss"],
		)?;

		let timeout_secs = raw.request.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
		if timeout_secs == 0 {
			return Err(ConfigError::ZeroTimeout);
		}

		Ok(Self {
			api_url,
			channel_url,
			request_timeout: Duration::from_secs(timeout_secs),
			credential_path: raw.storage.credential_path,
			log_level: raw.log.level.unwrap_or_default(),
		})
	}
}

fn parse_endpoint(key: &'static str, value: &str, schemes: &[&str]) -> Result<Url> {
	let url = Url::parse(value).map_err(|reason| ConfigError::InvalidUrl {
		key,
		value: value.to_string(),
		reason,
	})?;
	if !schemes.contains(&url.scheme()) {
		return Err(ConfigError::UnsupportedScheme {
			key,
			scheme: url.scheme().to_string(),
		});
	}
	Ok(url)
}
