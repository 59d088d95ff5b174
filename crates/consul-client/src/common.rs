//! Common utilities for the Consul API client
//!
//! Wraps a `reqwest::Client` with the base URL and ACL token so that every
//! request carries the same headers and error mapping.

use crate::error::ConsulError;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Header Consul reads the ACL token from
pub const TOKEN_HEADER: &str = "X-Consul-Token";

/// HTTP client wrapper with authentication
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a path and optional query parameters
    pub fn build_url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&build_query_string(query));
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", "application/json");
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    /// Make a GET request and decode the JSON body
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ConsulError> {
        let url = self.build_url(path, query);
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        decode(check_status(response).await?).await
    }

    /// Make a GET request, mapping a 404 to `None`
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>, ConsulError> {
        let url = self.build_url(path, query);
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        if response.status() == 404 {
            return Ok(None);
        }
        // Consul answers `null` for unknown nodes on some endpoints
        decode::<Option<T>>(check_status(response).await?).await
    }

    /// Make a PUT request with a JSON body and return the raw JSON response
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<serde_json::Value, ConsulError> {
        let url = self.build_url(path, &[]);
        let body = serde_json::to_value(body)?;
        debug!("PUT {} with body: {}", url, body);

        let response = self
            .authorize(self.client.put(&url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;
        decode(check_status(response).await?).await
    }
}

/// Turn a non-2xx response into `ConsulError::Api`
async fn check_status(response: Response) -> Result<Response, ConsulError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ConsulError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Decode a JSON body, keeping a preview of the payload for error messages
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ConsulError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        debug!(
            "error decoding response body: {} - Response (first 500 chars): {}",
            e,
            text.chars().take(500).collect::<String>()
        );
        ConsulError::Serialization(e)
    })
}

/// Build query string from filters
pub fn build_query_string(filters: &[(&str, &str)]) -> String {
    filters
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
