use super::matcher::RequestMatcher;
use grantflow::{HttpResponse, TransportError};
use http::StatusCode;

/// An expectation for a request
#[derive(Debug, Clone)]
pub struct Expectation {
    pub(crate) matcher: RequestMatcher,
    pub(crate) response: MockResponse,
    pub(crate) times: Times,
    pub(crate) call_count: usize,
}

impl Expectation {
    /// Create a new expectation
    pub fn new(matcher: RequestMatcher) -> Self {
        Self {
            matcher,
            response: MockResponse::default(),
            times: Times::Once,
            call_count: 0,
        }
    }

    /// Check the recorded call count against the expected one
    pub(crate) fn check(&self) -> Result<(), String> {
        let n = self.call_count;
        let ok = match self.times {
            Times::Once => n == 1,
            Times::Exactly(expected) => n == expected,
            Times::AtLeast(min) => n >= min,
            Times::AtMost(max) => n <= max,
            Times::Any => true,
        };
        if ok {
            Ok(())
        } else {
            Err(format!(
                "Expectation {:?} expected {:?} calls, got {}",
                self.matcher, self.times, n
            ))
        }
    }
}

/// Define how many times an expectation should be matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Times {
    Once,
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
    Any,
}

/// A scripted outcome of one request
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// The endpoint answered
    Http { status: StatusCode, body: String },
    /// The connection failed before any answer
    Transport(String),
}

impl Default for MockResponse {
    fn default() -> Self {
        MockResponse::Http {
            status: StatusCode::OK,
            body: String::new(),
        }
    }
}

impl MockResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form-encoded token response carrying `access_token`
    pub fn token(access_token: &str) -> Self {
        Self::new().form(&[("access_token", access_token), ("token_type", "bearer")])
    }

    /// A connection-level failure
    pub fn transport_error(message: impl Into<String>) -> Self {
        MockResponse::Transport(message.into())
    }

    pub fn status(self, status: StatusCode) -> Self {
        match self {
            MockResponse::Http { body, .. } => MockResponse::Http { status, body },
            transport => transport,
        }
    }

    pub fn body(self, body: impl Into<String>) -> Self {
        match self {
            MockResponse::Http { status, .. } => MockResponse::Http {
                status,
                body: body.into(),
            },
            transport => transport,
        }
    }

    /// Form-encode the given pairs as the body
    pub fn form(self, pairs: &[(&str, &str)]) -> Self {
        let body = serde_urlencoded::to_string(pairs).unwrap();
        self.body(body)
    }

    /// Serialize a JSON body
    pub fn json(self, body: impl serde::Serialize) -> Self {
        let body = serde_json::to_string(&body).unwrap();
        self.body(body)
    }

    pub(crate) fn to_result(&self) -> Result<HttpResponse, TransportError> {
        match self {
            MockResponse::Http { status, body } => Ok(HttpResponse::new(*status, body.clone())),
            MockResponse::Transport(message) => Err(TransportError::new(message.clone())),
        }
    }
}
