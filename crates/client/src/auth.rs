//! Authentication collaborator: login, registration and credential checks.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::credential::{Credential, CredentialStore};
use crate::error::{ApiError, CredentialError};
use crate::http::{HttpClient, decode};

/// Email/password pair submitted to login and registration.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}

impl Credentials {
	/// Creates a credential pair.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			email: email.into(),
			password: password.into(),
		}
	}
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Account details returned for a valid credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
	/// Account identity.
	#[serde(default, rename = "_id", alias = "id")]
	pub id: Option<String>,
	/// Account email.
	#[serde(default)]
	pub email: Option<String>,
}

#[derive(Deserialize)]
struct LoginResponse {
	token: String,
}

#[derive(Deserialize)]
struct UserEnvelope {
	user: UserProfile,
}

/// Remote authentication endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
	/// `POST /auth/login`, returning a fresh credential.
	async fn login(&self, credentials: &Credentials) -> Result<Credential, ApiError>;

	/// `POST /auth/register`
	async fn register(&self, credentials: &Credentials) -> Result<(), ApiError>;

	/// `GET /auth`, returning the account behind `credential`.
	async fn current_user(&self, credential: &Credential) -> Result<UserProfile, ApiError>;
}

/// [`AuthApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
	http: HttpClient,
}

impl HttpAuthApi {
	/// Wraps an HTTP client.
	pub fn new(http: HttpClient) -> Self {
		Self { http }
	}
}

#[async_trait]
impl AuthApi for HttpAuthApi {
	async fn login(&self, credentials: &Credentials) -> Result<Credential, ApiError> {
		let request = self
			.http
			.request(Method::POST, &["auth", "login"], None)
			.json(credentials);
		let response: LoginResponse = decode(self.http.send(request).await?).await?;
		Credential::parse(&response.token)
			.ok_or_else(|| ApiError::Decode("login response carried an empty token".into()))
	}

	async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
		let request = self
			.http
			.request(Method::POST, &["auth", "register"], None)
			.json(credentials);
		self.http.send(request).await?;
		Ok(())
	}

	async fn current_user(&self, credential: &Credential) -> Result<UserProfile, ApiError> {
		let request = self.http.request(Method::GET, &["auth"], Some(credential));
		let envelope: UserEnvelope = decode(self.http.send(request).await?).await?;
		Ok(envelope.user)
	}
}

/// Failure of an authentication flow step.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
	/// The remote call failed.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// The credential could not be persisted or cleared.
	#[error(transparent)]
	Storage(#[from] CredentialError),
}

/// Owns the session credential: obtains it, persists it and discards it.
#[derive(Clone)]
pub struct Authenticator {
	api: Arc<dyn AuthApi>,
	store: Arc<dyn CredentialStore>,
}

impl Authenticator {
	/// Combines remote endpoints with durable storage.
	pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn CredentialStore>) -> Self {
		Self { api, store }
	}

	/// Logs in and persists the returned credential.
	pub async fn login(&self, credentials: &Credentials) -> Result<Credential, LoginError> {
		let credential = self.api.login(credentials).await?;
		self.store.save(&credential)?;
		tracing::info!(email = %credentials.email, "logged in");
		Ok(credential)
	}

	/// Registers a new account. Does not log in.
	pub async fn register(&self, credentials: &Credentials) -> Result<(), LoginError> {
		self.api.register(credentials).await?;
		tracing::info!(email = %credentials.email, "registered");
		Ok(())
	}

	/// Returns the stored credential, if any.
	pub fn current_credential(&self) -> Result<Option<Credential>, CredentialError> {
		self.store.load()
	}

	/// Checks the stored credential against the server.
	///
	/// Returns `None` when no credential is stored. A rejected credential is
	/// cleared and also yields `None`; other failures are returned.
	pub async fn verify(&self) -> Result<Option<UserProfile>, LoginError> {
		let Some(credential) = self.store.load()? else {
			return Ok(None);
		};
		match self.api.current_user(&credential).await {
			Ok(user) => Ok(Some(user)),
			Err(err) if err.is_auth() => {
				tracing::warn!(error = %err, "stored credential rejected");
				self.store.clear()?;
				Ok(None)
			}
			Err(err) => Err(err.into()),
		}
	}

	/// Discards the stored credential.
	pub fn logout(&self) -> Result<(), CredentialError> {
		self.store.clear()?;
		tracing::info!("logged out");
		Ok(())
	}

	/// The backing credential store.
	pub fn store(&self) -> &Arc<dyn CredentialStore> {
		&self.store
	}
}
