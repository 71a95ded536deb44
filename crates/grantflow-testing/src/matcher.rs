use grantflow::HttpRequest;
use http::Method;
use std::collections::HashMap;

/// Matcher for outgoing token requests
#[derive(Debug, Clone, Default)]
pub struct RequestMatcher {
    pub(crate) method: Option<Method>,
    pub(crate) uri: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) form_params: Vec<(String, String)>,
    pub(crate) body_string: Option<String>,
}

impl RequestMatcher {
    /// Create a new matcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Match a specific HTTP method
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Match the URI, ignoring its query string
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Match a specific header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Match a form parameter, sent either in the body or in the query string
    pub fn form_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_params.push((key.into(), value.into()));
        self
    }

    /// Match exact string body
    pub fn body_string(mut self, body: impl Into<String>) -> Self {
        self.body_string = Some(body.into());
        self
    }

    /// Check if the matcher matches a request
    pub fn matches(&self, request: &HttpRequest) -> bool {
        if let Some(m) = &self.method {
            if *m != request.method {
                return false;
            }
        }

        let (path, query) = match request.uri.split_once('?') {
            Some((path, query)) => (path, query),
            None => (request.uri.as_str(), ""),
        };

        if let Some(u) = &self.uri {
            if u != path {
                return false;
            }
        }

        for (k, v) in &self.headers {
            match request.headers.get(k.as_str()) {
                Some(val) => {
                    if val != v.as_str() {
                        return false;
                    }
                }
                None => return false,
            }
        }

        if !self.form_params.is_empty() {
            let mut sent: HashMap<String, String> =
                serde_urlencoded::from_str(query).unwrap_or_default();
            let body: HashMap<String, String> =
                serde_urlencoded::from_str(&request.body).unwrap_or_default();
            sent.extend(body);

            for (k, v) in &self.form_params {
                if sent.get(k) != Some(v) {
                    return false;
                }
            }
        }

        if let Some(expected) = &self.body_string {
            if expected != &request.body {
                return false;
            }
        }

        true
    }
}
