//! HTTP executor seam
//!
//! The flow builds [`HttpRequest`]s and hands them to an [`HttpExecutor`].
//! Executors report any HTTP status as a normal [`HttpResponse`]; only
//! connection-level failures become a [`TransportError`].

use async_trait::async_trait;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};

#[cfg(feature = "reqwest")]
pub mod reqwest_executor;

/// Connection-level failure (DNS, TLS, timeout, reset...).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Transport error: {message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Create a transport error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An outgoing request to the provider.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Absolute URI, including any query string.
    pub uri: String,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body (empty for `GET`).
    pub body: String,
}

impl HttpRequest {
    /// Create a request without headers or body.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: HeaderMap::new(),
            body: String::new(),
        }
    }

    /// Add a header.
    pub fn header(mut self, name: header::HeaderName, value: &'static str) -> Self {
        self.headers.insert(name, HeaderValue::from_static(value));
        self
    }

    /// Set the body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// URI without its query string, safe to log.
    pub fn uri_path(&self) -> &str {
        match self.uri.split_once('?') {
            Some((path, _)) => path,
            None => &self.uri,
        }
    }
}

/// The provider's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: StatusCode,
    body: String,
}

impl HttpResponse {
    /// Create a response.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the body.
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Executes requests on behalf of the flow.
///
/// Timeouts and cancellation belong to the implementation; the flow waits
/// for one definite outcome per call and never retries.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Send the request and return the complete response.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success() {
        assert!(HttpResponse::new(StatusCode::OK, "").is_success());
        assert!(HttpResponse::new(StatusCode::NO_CONTENT, "").is_success());
        assert!(!HttpResponse::new(StatusCode::BAD_REQUEST, "").is_success());
        assert!(!HttpResponse::new(StatusCode::FOUND, "").is_success());
    }

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::new(Method::POST, "https://auth.example.com/token")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("a=b");

        assert_eq!(request.method, Method::POST);
        assert_eq!(
            request.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
        assert_eq!(request.body, "a=b");
    }

    #[test]
    fn test_uri_path_drops_query() {
        let request = HttpRequest::new(
            Method::GET,
            "https://auth.example.com/token?client_secret=s3cret&code=abc",
        );
        assert_eq!(request.uri_path(), "https://auth.example.com/token");

        let plain = HttpRequest::new(Method::POST, "https://auth.example.com/token");
        assert_eq!(plain.uri_path(), "https://auth.example.com/token");
    }
}
