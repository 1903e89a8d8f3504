//! HTTP client for the Scribe remote endpoints.
//!
//! One client talks to three parties: the control plane (write grants), the object store
//! (direct PUT to a presigned URL) and the catalog (registration and listing). Control plane
//! and catalog answers use the `{ code, msg, data }` envelope; the object store answers with a
//! bare HTTP status.

pub mod api;
pub mod envelope;
pub mod error;
pub mod traits;

use reqwest::Client;
use scribe_core::IngestConfig;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use envelope::Envelope;
pub use error::ClientError;
pub use traits::{AuthorizationClient, CatalogRegistrar, Uploader};

/// Authentication strategy for the control plane and catalog.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// No credentials (session handled elsewhere, e.g. by a proxy)
    Anonymous,
}

/// HTTP client for the control plane, object store and catalog.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_prefix: String,
    auth: Auth,
}

impl ApiClient {
    /// Every request made through this client, PUTs to the object store included, is bounded
    /// by `timeout`.
    pub fn new(
        base_url: String,
        api_prefix: String,
        auth: Auth,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_prefix,
            auth,
        })
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self, ClientError> {
        let auth = match &config.api_token {
            Some(token) if !token.is_empty() => Auth::Bearer(token.clone()),
            _ => Auth::Anonymous,
        };

        Self::new(
            config.api_url.clone(),
            config.api_prefix(),
            auth,
            config.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path (relative to the version prefix).
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::Anonymous => request,
        }
    }

    /// GET request with optional query parameters. Unwraps the response envelope.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, ClientError> {
        let url = self.build_url(path);
        let mut request = self.apply_auth(self.client.get(&url));

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        Self::read_envelope(response).await
    }

    /// POST JSON body. Unwraps the response envelope.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ClientError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));

        let response = request.send().await?;
        Self::read_envelope(response).await
    }

    /// PUT raw bytes to an absolute URL. Credentials are never attached: presigned URLs
    /// carry their own authorization.
    pub async fn put_bytes(
        &self,
        url: &str,
        content_type: &str,
        body: bytes::Bytes,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Option<T>, ClientError> {
        let response = Self::check_status(response).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        envelope.into_result()
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}
