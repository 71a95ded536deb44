//! [`HttpExecutor`] backed by `reqwest`

use super::{HttpExecutor, HttpRequest, HttpResponse, TransportError};
use async_trait::async_trait;
use std::time::Duration;

/// Default timeout for token requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes requests with a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    /// Create an executor with the default 30 second timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create an executor with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::new(e.to_string()))?;
        Ok(Self { client })
    }

    /// Reuse an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let endpoint = request.uri_path().to_string();
        let HttpRequest {
            method,
            uri,
            headers,
            body,
        } = request;

        let response = self
            .client
            .request(method, uri.as_str())
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        tracing::debug!(
            endpoint = %endpoint,
            status = status.as_u16(),
            "Token endpoint responded"
        );

        Ok(HttpResponse::new(status, body))
    }
}

/// Convert a reqwest error, dropping the request URL.
fn transport_error(e: reqwest::Error) -> TransportError {
    TransportError::new(e.without_url().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let executor = ReqwestExecutor::with_timeout(Duration::from_secs(2)).unwrap();
        let request = HttpRequest::new(Method::POST, "http://127.0.0.1:1/token");

        let result = executor.execute(request).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_transport_error_omits_query_credentials() {
        let executor = ReqwestExecutor::with_timeout(Duration::from_secs(2)).unwrap();
        let request = HttpRequest::new(
            Method::GET,
            "http://127.0.0.1:1/token?client_secret=s3cret&code=abc",
        );

        let err = executor.execute(request).await.unwrap_err();
        assert!(!err.message().contains("s3cret"));
        assert!(!err.message().contains("code=abc"));
    }
}
