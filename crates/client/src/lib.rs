//! Request client adapter for the widget collection resource.
//!
//! This crate owns everything that crosses the REST boundary:
//! * [`WidgetApi`]: fetch/create/update/delete against `/widgets`
//! * [`AuthApi`] and [`Authenticator`]: login, registration and credential checks
//! * [`CredentialStore`]: durable storage of the session [`Credential`]
//!
//! Every failure is normalized into [`ApiError`]; [`ApiError::is_auth`]
//! separates rejected credentials from other failures so callers can route
//! the user back to authentication.

#![warn(missing_docs)]

pub mod auth;
pub mod credential;
pub mod error;
pub mod http;
pub mod widgets;

pub use auth::{AuthApi, Authenticator, Credentials, HttpAuthApi, LoginError, UserProfile};
pub use credential::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ApiError, CredentialError};
pub use http::HttpClient;
pub use widgets::{HttpWidgetApi, WidgetApi};
