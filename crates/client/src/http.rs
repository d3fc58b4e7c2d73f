//! Shared HTTP plumbing: endpoint resolution, credential attachment and
//! response classification.

use std::time::Duration;

use quorum_config::Config;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::credential::Credential;
use crate::error::ApiError;

/// HTTP client bound to the configured API base URL.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
	client: Client,
	base: Url,
}

impl HttpClient {
	/// Creates a client whose requests all time out after `timeout`.
	pub fn new(base: Url, timeout: Duration) -> Result<Self, ApiError> {
		let client = Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| ApiError::Transport(e.to_string()))?;
		Ok(Self { client, base })
	}

	/// Creates a client from the API endpoint and timeout in `config`.
	pub fn from_config(config: &Config) -> Result<Self, ApiError> {
		Self::new(config.api_url.clone(), config.request_timeout)
	}

	/// Base URL all endpoints are resolved against.
	pub fn base(&self) -> &Url {
		&self.base
	}

	/// Resolves `segments` below the base URL.
	///
	/// Segments are appended rather than joined, so a base with or without a
	/// trailing slash resolves the same way, and each segment is
	/// percent-encoded.
	pub fn endpoint(&self, segments: &[&str]) -> Url {
		let mut url = self.base.clone();
		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}
		url
	}

	pub(crate) fn request(
		&self,
		method: Method,
		segments: &[&str],
		credential: Option<&Credential>,
	) -> RequestBuilder {
		let request = self.client.request(method, self.endpoint(segments));
		match credential {
			Some(credential) => request.header(AUTHORIZATION, credential.bearer()),
			None => request,
		}
	}

	/// Sends `request` and fails on any non-success status.
	pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
		let response = request.send().await.map_err(ApiError::from_reqwest)?;
		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}

		let body = response.text().await.unwrap_or_default();
		let err = ApiError::from_status(status.as_u16(), &body);
		tracing::debug!(status = status.as_u16(), error = %err, "request rejected");
		Err(err)
	}
}

/// Decodes a JSON response body.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
	let bytes = response.bytes().await.map_err(ApiError::from_reqwest)?;
	serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn client(base: &str) -> HttpClient {
		HttpClient::new(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
	}

	#[test]
	fn endpoint_appends_below_base_path() {
		let http = client("https://example.com/api");
		assert_eq!(
			http.endpoint(&["widgets"]).as_str(),
			"https://example.com/api/widgets"
		);
	}

	#[test]
	fn trailing_slash_in_base_is_equivalent() {
		let http = client("https://example.com/api/");
		assert_eq!(
			http.endpoint(&["widgets", "42"]).as_str(),
			"https://example.com/api/widgets/42"
		);
	}

	#[test]
	fn identity_segments_are_encoded() {
		let http = client("http://localhost:5000/api");
		assert_eq!(
			http.endpoint(&["widgets", "a/b c"]).as_str(),
			"http://localhost:5000/api/widgets/a%2Fb%20c"
		);
	}

	#[test]
	fn request_attaches_bearer_header() {
		let http = client("http://localhost:5000/api");
		let credential = Credential::parse("tok").unwrap();
		let request = http
			.request(Method::GET, &["widgets"], Some(&credential))
			.build()
			.unwrap();
		assert_eq!(request.headers()[AUTHORIZATION], "Bearer tok");

		let anonymous = http.request(Method::POST, &["auth", "login"], None).build().unwrap();
		assert!(anonymous.headers().get(AUTHORIZATION).is_none());
	}
}
