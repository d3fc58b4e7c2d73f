//! Session credential and its durable storage.

use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::CredentialError;

/// Opaque bearer token identifying the signed-in user.
///
/// `Debug` output is redacted so the token never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
	/// Wraps a token, rejecting blank input.
	pub fn parse(token: &str) -> Option<Self> {
		let token = token.trim();
		(!token.is_empty()).then(|| Self(token.to_string()))
	}

	/// Returns the raw token.
	pub fn token(&self) -> &str {
		&self.0
	}

	/// Value for the `Authorization` header.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.0)
	}
}

impl fmt::Debug for Credential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Credential(<redacted>)")
	}
}

/// Durable storage for the session credential.
///
/// Survives restarts; absence of a stored credential routes the user to the
/// authentication flow.
pub trait CredentialStore: Send + Sync {
	/// Returns the stored credential, if any.
	fn load(&self) -> Result<Option<Credential>, CredentialError>;
	/// Replaces the stored credential.
	fn save(&self, credential: &Credential) -> Result<(), CredentialError>;
	/// Removes the stored credential. Clearing an empty store succeeds.
	fn clear(&self) -> Result<(), CredentialError>;
}

/// Credential persisted as a single-line file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
	path: PathBuf,
}

impl FileCredentialStore {
	/// Creates a store backed by `path`. The file is created on first save.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Creates a store at `path`, or at [`FileCredentialStore::default_path`]
	/// when no path is configured.
	pub fn at_or_default(path: Option<&Path>) -> Result<Self, CredentialError> {
		match path {
			Some(path) => Ok(Self::new(path)),
			None => Ok(Self::new(Self::default_path()?)),
		}
	}

	/// Platform location of the credential file.
	pub fn default_path() -> Result<PathBuf, CredentialError> {
		dirs::data_dir()
			.map(|dir| dir.join("quorum").join("credential"))
			.ok_or(CredentialError::NoDataDir)
	}

	/// Path of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn io_error(&self, error: std::io::Error) -> CredentialError {
		CredentialError::Io {
			path: self.path.clone(),
			error,
		}
	}
}

impl CredentialStore for FileCredentialStore {
	fn load(&self) -> Result<Option<Credential>, CredentialError> {
		match std::fs::read_to_string(&self.path) {
			Ok(text) => Ok(Credential::parse(&text)),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
			Err(e) => Err(self.io_error(e)),
		}
	}

	fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
		if let Some(parent) = self.path.parent() {
			std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
		}
		let mut options = std::fs::OpenOptions::new();
		options.write(true).create(true).truncate(true);
		#[cfg(unix)]
		{
			use std::os::unix::fs::OpenOptionsExt;
			options.mode(0o600);
		}
		let mut file = options.open(&self.path).map_err(|e| self.io_error(e))?;

		// `mode` only applies on creation; tighten a file left by an older save.
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			file.set_permissions(std::fs::Permissions::from_mode(0o600))
				.map_err(|e| self.io_error(e))?;
		}
		file.write_all(credential.token().as_bytes())
			.map_err(|e| self.io_error(e))?;

		tracing::debug!(path = %self.path.display(), "credential saved");
		Ok(())
	}

	fn clear(&self) -> Result<(), CredentialError> {
		match std::fs::remove_file(&self.path) {
			Ok(()) => {
				tracing::debug!(path = %self.path.display(), "credential cleared");
				Ok(())
			}
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(self.io_error(e)),
		}
	}
}

/// In-memory credential store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
	slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store already holding `credential`.
	pub fn with(credential: Credential) -> Self {
		Self {
			slot: Mutex::new(Some(credential)),
		}
	}
}

impl CredentialStore for MemoryCredentialStore {
	fn load(&self) -> Result<Option<Credential>, CredentialError> {
		Ok(self.slot.lock().clone())
	}

	fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
		*self.slot.lock() = Some(credential.clone());
		Ok(())
	}

	fn clear(&self) -> Result<(), CredentialError> {
		*self.slot.lock() = None;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blank_tokens_are_rejected() {
		assert!(Credential::parse("").is_none());
		assert!(Credential::parse("  \n").is_none());
		assert_eq!(Credential::parse(" abc\n").unwrap().token(), "abc");
	}

	#[test]
	fn debug_output_is_redacted() {
		let credential = Credential::parse("secret-token").unwrap();
		assert_eq!(format!("{credential:?}"), "Credential(<redacted>)");
		assert_eq!(credential.bearer(), "Bearer secret-token");
	}

	#[test]
	fn file_store_persists_across_instances() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested").join("credential");

		let store = FileCredentialStore::new(&path);
		assert_eq!(store.load().unwrap(), None);

		store.save(&Credential::parse("tok").unwrap()).unwrap();
		let reopened = FileCredentialStore::new(&path);
		assert_eq!(reopened.load().unwrap(), Credential::parse("tok"));

		reopened.clear().unwrap();
		assert_eq!(store.load().unwrap(), None);
		store.clear().unwrap();
	}

	#[cfg(unix)]
	#[test]
	fn saved_credential_is_owner_only() {
		use std::os::unix::fs::PermissionsExt;

		let dir = tempfile::tempdir().unwrap();
		let fresh = dir.path().join("fresh");
		FileCredentialStore::new(&fresh)
			.save(&Credential::parse("tok").unwrap())
			.unwrap();
		let mode = std::fs::metadata(&fresh).unwrap().permissions().mode();
		assert_eq!(mode & 0o777, 0o600);

		let existing = dir.path().join("existing");
		std::fs::write(&existing, "old-token-that-is-longer").unwrap();
		std::fs::set_permissions(&existing, std::fs::Permissions::from_mode(0o644)).unwrap();
		let store = FileCredentialStore::new(&existing);
		store.save(&Credential::parse("new").unwrap()).unwrap();
		let mode = std::fs::metadata(&existing).unwrap().permissions().mode();
		assert_eq!(mode & 0o777, 0o600);
		assert_eq!(store.load().unwrap(), Credential::parse("new"));
	}

	#[test]
	fn memory_store_round_trips() {
		let store = MemoryCredentialStore::new();
		assert!(store.load().unwrap().is_none());
		store.save(&Credential::parse("a").unwrap()).unwrap();
		assert_eq!(store.load().unwrap(), Credential::parse("a"));
		store.clear().unwrap();
		assert!(store.load().unwrap().is_none());
	}
}
