//! JSON-over-HTTP client for the Shopfront backend.
//!
//! Every request is single-shot: no retries, no backoff, no caching and no
//! timeout. Non-success responses are normalized into [`ApiError::Status`]
//! carrying the backend's message.

mod error;

pub use error::ApiError;

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientConfig;

use error::error_message;

/// HTTP methods used by the backend contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Shopfront backend.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    /// Base URL without a trailing slash.
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be built
    /// (for example when the TLS backend fails to initialize).
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_base_url(&config.api_base_url)
    }

    /// Create a client for an explicit base URL.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::new`].
    pub fn with_base_url(base_url: &Url) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("shopfront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: base_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Base URL endpoints are appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Issue a request and decode the JSON response.
    ///
    /// `endpoint` is appended to the base URL verbatim (including any query
    /// string). The body, when present, is sent as JSON and the token, when
    /// present, as `Authorization: Bearer <token>`. An empty success body
    /// decodes as JSON `null`.
    ///
    /// # Errors
    ///
    /// - `ApiError::Status` for non-2xx responses, carrying the message
    ///   extracted from the body
    /// - `ApiError::Transport` if the request could not be completed
    /// - `ApiError::Decode` if a success body does not match `T`
    #[instrument(skip(self, body, token), fields(method = %method, endpoint = %endpoint))]
    pub async fn call<B, T>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&B>,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(endpoint)?;

        let mut request = self
            .inner
            .client
            .request(method.into(), url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(status, &text);
            warn!(status = status.as_u16(), message = %message, "Backend returned non-success status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = status.as_u16(), bytes = text.len(), "Backend request succeeded");

        let payload = if text.trim().is_empty() { "null" } else { &text };
        serde_json::from_str(payload).map_err(|source| {
            warn!(
                error = %source,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to decode backend response"
            );
            ApiError::Decode {
                endpoint: endpoint.to_string(),
                source,
            }
        })
    }

    /// `GET` an endpoint.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        self.call::<(), T>(endpoint, Method::Get, None, token).await
    }

    /// `POST` a JSON body to an endpoint.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn post<B, T>(
        &self,
        endpoint: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(endpoint, Method::Post, Some(body), token).await
    }

    /// `PUT` a JSON body to an endpoint.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn put<B, T>(
        &self,
        endpoint: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(endpoint, Method::Put, Some(body), token).await
    }

    /// `DELETE` an endpoint.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        self.call::<(), T>(endpoint, Method::Delete, None, token).await
    }

    /// Join an endpoint path onto the base URL.
    fn url(&self, endpoint: &str) -> Result<Url, ApiError> {
        let joined = if endpoint.starts_with('/') {
            format!("{}{endpoint}", self.inner.base_url)
        } else {
            format!("{}/{endpoint}", self.inner.base_url)
        };

        Url::parse(&joined).map_err(|source| ApiError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_base_url(&Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn test_url_preserves_base_path() {
        let api = client("https://shop.example.com/api");
        assert_eq!(
            api.url("/products").unwrap().as_str(),
            "https://shop.example.com/api/products"
        );
    }

    #[test]
    fn test_url_handles_trailing_and_missing_slashes() {
        let api = client("https://shop.example.com/api/");
        assert_eq!(api.base_url(), "https://shop.example.com/api");
        assert_eq!(
            api.url("orders/7").unwrap().as_str(),
            "https://shop.example.com/api/orders/7"
        );
    }

    #[test]
    fn test_url_keeps_query_string() {
        let api = client("https://shop.example.com/api");
        let url = api.url("/orders/7?date=2024-05-01").unwrap();
        assert_eq!(url.query(), Some("date=2024-05-01"));
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Delete.to_string(), "DELETE");
        assert_eq!(reqwest::Method::from(Method::Put), reqwest::Method::PUT);
    }
}
