//! HTTP client for the Rick and Morty REST API.
//!
//! `ApiClient` owns the configured `reqwest::Client`, the base endpoint and
//! the request timeout. It normalizes every failure into an [`ApiError`] and
//! logs its class; retrying is left to the query cache.

use std::time::Duration;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use super::error::{ApiError, ErrorClass};

// ============================================================================
// Constants
// ============================================================================

/// Public endpoint of the API.
pub const DEFAULT_BASE_URL: &str = "https://rickandmortyapi.com/api";

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Query string parameters, already resolved to strings.
pub type QueryParams = Vec<(&'static str, String)>;

/// API client for the Rick and Morty API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client against the public endpoint with the default timeout.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Create a client against another endpoint, e.g. a local mirror or a
    /// mock server in tests.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and decode its JSON body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%method, url = %url, ?params, "Sending request");

        let result = self.send(method.clone(), &url, params).await;
        if let Err(ref e) = result {
            Self::log_failure(&method, &url, e);
        }
        result
    }

    /// GET shorthand for [`ApiClient::request`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        self.request(Method::GET, path, params).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        let mut builder = self.client.request(method, url);
        if !params.is_empty() {
            builder = builder.query(params);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        let response = Self::check_response(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;

        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    fn log_failure(method: &Method, url: &str, err: &ApiError) {
        let class = err.class();
        match class {
            ErrorClass::Server => {
                error!(class = %class, %method, url = url, error = %err, "API error")
            }
            ErrorClass::Network => {
                warn!(class = %class, %method, url = url, error = %err, "Network error")
            }
            ErrorClass::Client => {
                error!(class = %class, %method, url = url, error = %err, "Request error")
            }
        }
    }
}
