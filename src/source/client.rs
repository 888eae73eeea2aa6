// Records API HTTP client.
// Handles base URL joining, timeouts, and response status conversion.

use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};

use crate::error::{Result, SyncError};

/// Per-request timeout used by the updater.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client bound to one records API.
#[derive(Debug, Clone)]
pub struct RecordsClient {
    client: Client,
    base_url: String,
    element_path: String,
}

impl RecordsClient {
    /// Create a client for the API at `base_url`.
    ///
    /// `element_path` is the route prefix that takes a trailing `/{index}`.
    pub fn new(base_url: &str, element_path: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("cache-sync/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SyncError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            element_path: format!("/{}", element_path.trim_matches('/')),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(super) fn element_endpoint(&self, index: u64) -> String {
        format!("{}/{}", self.element_path, index)
    }

    /// Make a GET request against the API.
    pub async fn get(&self, endpoint: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self.client.get(&url).send().await.map_err(SyncError::Http)?;
        Self::check_response(response).await
    }

    /// Check response status and convert errors.
    async fn check_response(response: Response) -> Result<Response> {
        match response.status() {
            StatusCode::OK => Ok(response),
            status => {
                let url = response.url().to_string();
                Err(SyncError::Other(format!(
                    "HTTP {} from {}: {}",
                    status,
                    url,
                    response.text().await.unwrap_or_default()
                )))
            }
        }
    }
}
