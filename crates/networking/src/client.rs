//! Remote fetcher
//!
//! [`RemoteFetcher`] is the single seam between the state layer and the
//! backend. [`HttpFetcher`] implements it over reqwest: it resolves paths
//! against the base URL, injects `Authorization: Bearer` from the session,
//! encodes bodies, normalizes errors, and retries transient GET failures.
//! Writes are sent exactly once.

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Response as ReqwestResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use crate::auth::SessionProvider;
use crate::config::FetcherConfig;
use crate::error::{FetchError, Result};
use crate::request::{ApiRequest, HttpMethod, RequestBody};
use crate::retry::retry_transient;

/// Generic request function used by synchronizers
///
/// Implementations return the decoded JSON body. An empty 2xx body decodes to
/// `Value::Null`.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Execute a request and return the JSON body
    async fn execute(&self, request: ApiRequest) -> Result<Value>;
}

/// Decode a JSON value into `T`, reporting mismatches as [`FetchError::Parse`]
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| FetchError::Parse(format!("Unexpected response shape: {}", e)))
}

/// Typed requests on top of any [`RemoteFetcher`]
#[async_trait]
pub trait RemoteFetcherExt {
    /// Execute a request and decode the body into `T`
    async fn request<T>(&self, request: ApiRequest) -> Result<T>
    where
        T: DeserializeOwned + Send;
}

#[async_trait]
impl<F> RemoteFetcherExt for F
where
    F: RemoteFetcher + ?Sized,
{
    async fn request<T>(&self, request: ApiRequest) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        let value = self.execute(request).await?;
        decode(value)
    }
}

/// HTTP implementation of [`RemoteFetcher`]
pub struct HttpFetcher {
    client: ReqwestClient,
    config: FetcherConfig,
    session: Arc<dyn SessionProvider>,
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpFetcher {
    /// Create a fetcher
    ///
    /// # Examples
    /// ```
    /// use networking::{FetcherConfig, HttpFetcher, SessionHandle};
    /// use std::sync::Arc;
    ///
    /// let session = SessionHandle::signed_in("token", None);
    /// let fetcher = HttpFetcher::new(
    ///     FetcherConfig::new("https://api.example.com"),
    ///     Arc::new(session),
    /// )
    /// .unwrap();
    /// assert_eq!(fetcher.config().base_url, "https://api.example.com");
    /// ```
    pub fn new(config: FetcherConfig, session: Arc<dyn SessionProvider>) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config, session })
    }

    /// Get the fetcher configuration
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<Value> {
        let url = self.url(&request.path);

        let mut req = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Patch => self.client.patch(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        if let Some(token) = self.session.bearer_token() {
            req = req.bearer_auth(token);
        }

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        match &request.body {
            Some(RequestBody::Json(value)) => {
                req = req.json(value);
            }
            Some(RequestBody::Bytes { content_type, data }) => {
                req = req.header("Content-Type", content_type).body(data.clone());
            }
            None => {}
        }

        let response = req
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("Request failed: {}", e)))?;

        Self::parse_response(response).await
    }

    async fn parse_response(response: ReqwestResponse) -> Result<Value> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Http { status: status.as_u16(), body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to read response: {}", e)))?;

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Parse(format!("Failed to parse JSON: {}", e)))
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    async fn execute(&self, request: ApiRequest) -> Result<Value> {
        tracing::debug!(method = request.method.as_str(), path = %request.path, "sending request");

        let result = if request.method.is_read() {
            retry_transient(&self.config.retry, || self.send_once(&request)).await
        } else {
            self.send_once(&request).await
        };

        if let Err(e) = &result {
            tracing::debug!(method = request.method.as_str(), path = %request.path, "request failed: {}", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionHandle;
    use serde::Deserialize;

    mockall::mock! {
        Fetcher {}

        #[async_trait]
        impl RemoteFetcher for Fetcher {
            async fn execute(&self, request: ApiRequest) -> Result<Value>;
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Language {
        id: String,
        code: String,
    }

    #[test]
    fn test_url_joining() {
        let fetcher = HttpFetcher::new(
            FetcherConfig::new("https://api.example.com/v1/"),
            Arc::new(SessionHandle::new()),
        )
        .unwrap();

        assert_eq!(fetcher.url("/languages"), "https://api.example.com/v1/languages");
        assert_eq!(fetcher.url("languages"), "https://api.example.com/v1/languages");
    }

    #[tokio::test]
    async fn test_typed_request_through_trait_object() {
        let mut mock = MockFetcher::new();
        mock.expect_execute()
            .withf(|req| req.method == HttpMethod::Get && req.path == "/languages")
            .times(1)
            .returning(|_| Ok(serde_json::json!([{"id": "2", "code": "te"}])));

        let fetcher: Arc<dyn RemoteFetcher> = Arc::new(mock);
        let languages: Vec<Language> = fetcher.request(ApiRequest::get("/languages")).await.unwrap();

        assert_eq!(languages, vec![Language { id: "2".to_string(), code: "te".to_string() }]);
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_parse_error() {
        let mut mock = MockFetcher::new();
        mock.expect_execute()
            .returning(|_| Ok(serde_json::json!({"unexpected": true})));

        let result: Result<Vec<Language>> = mock.request(ApiRequest::get("/languages")).await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }
}
