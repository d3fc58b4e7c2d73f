//! Widget collection resource.

use async_trait::async_trait;
use quorum_primitives::{Widget, WidgetDraft, WidgetId};
use reqwest::Method;

use crate::credential::Credential;
use crate::error::ApiError;
use crate::http::{HttpClient, decode};

/// Request/response access to the remote widget collection.
///
/// Implementations attach the session credential to every call and report
/// failures as [`ApiError`]. Each call completes or fails within a finite
/// timeout.
#[async_trait]
pub trait WidgetApi: Send + Sync {
	/// `GET /widgets`
	async fn list(&self) -> Result<Vec<Widget>, ApiError>;

	/// `POST /widgets`, returning the record with its server-assigned id.
	async fn create(&self, draft: &WidgetDraft) -> Result<Widget, ApiError>;

	/// `PUT /widgets/{id}`, returning the canonical record.
	async fn update(&self, id: &WidgetId, draft: &WidgetDraft) -> Result<Widget, ApiError>;

	/// `DELETE /widgets/{id}`
	async fn delete(&self, id: &WidgetId) -> Result<(), ApiError>;
}

/// [`WidgetApi`] over HTTP.
///
/// Construction requires a [`Credential`]: issuing widget calls without one
/// is a precondition violation callers must prevent by authenticating first.
#[derive(Debug, Clone)]
pub struct HttpWidgetApi {
	http: HttpClient,
	credential: Credential,
}

impl HttpWidgetApi {
	/// Binds the HTTP client to a session credential.
	pub fn new(http: HttpClient, credential: Credential) -> Self {
		Self { http, credential }
	}
}

const WIDGETS: &str = "widgets";

#[async_trait]
impl WidgetApi for HttpWidgetApi {
	async fn list(&self) -> Result<Vec<Widget>, ApiError> {
		let request = self
			.http
			.request(Method::GET, &[WIDGETS], Some(&self.credential));
		let widgets: Vec<Widget> = decode(self.http.send(request).await?).await?;
		tracing::debug!(count = widgets.len(), "fetched widgets");
		Ok(widgets)
	}

	async fn create(&self, draft: &WidgetDraft) -> Result<Widget, ApiError> {
		let request = self
			.http
			.request(Method::POST, &[WIDGETS], Some(&self.credential))
			.json(draft);
		let widget: Widget = decode(self.http.send(request).await?).await?;
		tracing::debug!(id = %widget.id, "created widget");
		Ok(widget)
	}

	async fn update(&self, id: &WidgetId, draft: &WidgetDraft) -> Result<Widget, ApiError> {
		let request = self
			.http
			.request(Method::PUT, &[WIDGETS, id.as_str()], Some(&self.credential))
			.json(draft);
		let widget: Widget = decode(self.http.send(request).await?).await?;
		tracing::debug!(id = %widget.id, "updated widget");
		Ok(widget)
	}

	async fn delete(&self, id: &WidgetId) -> Result<(), ApiError> {
		let request = self
			.http
			.request(Method::DELETE, &[WIDGETS, id.as_str()], Some(&self.credential));
		self.http.send(request).await?;
		tracing::debug!(%id, "deleted widget");
		Ok(())
	}
}
