//! HTTP implementation of [`SigmaApi`].
//!
//! Every request, including the file download on the separate files host,
//! carries the API key as the basic-auth username with an empty password.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::debug;
use url::Url;

use crate::api::types::{ArtifactReference, CreatedRun, FileMetadata, QueryRun};
use crate::api::SigmaApi;
use crate::config::ClientConfig;
use crate::error::{Result, SigmaError};

/// HTTP client for the query-run and file endpoints.
#[derive(Clone)]
pub struct HttpSigmaApi {
    base_url: Url,
    api_key: String,
    client: Client,
}

impl HttpSigmaApi {
    /// Creates a new HTTP client with the given configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SigmaError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url().clone(),
            api_key: config.api_key().to_string(),
            client,
        })
    }

    /// Builds an endpoint URL by appending path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SigmaError::config(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends an authenticated request and returns the body of a success response.
    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>> {
        let response = request.basic_auth(&self.api_key, Some("")).send().await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(SigmaError::remote(
                status.as_u16(),
                String::from_utf8_lossy(&body),
            ));
        }

        Ok(body.to_vec())
    }

    /// Sends a request and parses the JSON response body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send(request).await?;
        serde_json::from_slice(&body)
            .map_err(|e| SigmaError::protocol(format!("Failed to parse response: {}", e)))
    }
}

impl fmt::Debug for HttpSigmaApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSigmaApi")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SigmaApi for HttpSigmaApi {
    async fn create_query_run(&self, sql: &str) -> Result<String> {
        let url = self.endpoint(&["v1", "sigma", "query_runs"])?;
        debug!("POST {}", url);

        let created: CreatedRun = self
            .send_json(self.client.post(url).form(&[("sql", sql)]))
            .await?;
        Ok(created.id)
    }

    async fn retrieve_query_run(&self, run_id: &str) -> Result<QueryRun> {
        let url = self.endpoint(&["v1", "sigma", "query_runs", run_id])?;
        debug!("GET {}", url);

        self.send_json(self.client.get(url)).await
    }

    async fn retrieve_file(&self, file: &ArtifactReference) -> Result<FileMetadata> {
        let url = self.endpoint(&["v1", "files", file.id()])?;
        debug!("GET {}", url);

        self.send_json(self.client.get(url)).await
    }

    async fn download(&self, location: &Url) -> Result<Vec<u8>> {
        debug!(
            "GET {}{}",
            location.host_str().unwrap_or_default(),
            location.path()
        );

        self.send(self.client.get(location.clone())).await
    }
}
