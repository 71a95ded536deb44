use super::expectation::{Expectation, MockResponse, Times};
use super::matcher::RequestMatcher;
use async_trait::async_trait;
use grantflow::{HttpExecutor, HttpRequest, HttpResponse, TransportError};
use http::StatusCode;
use std::sync::{Arc, Mutex};

/// A scripted [`HttpExecutor`]
///
/// Requests are matched against expectations, newest first. Unmatched
/// requests are recorded and answered with `404`.
#[derive(Clone, Default)]
pub struct MockExecutor {
    state: Arc<Mutex<ExecutorState>>,
}

#[derive(Default)]
struct ExecutorState {
    expectations: Vec<Expectation>,
    requests: Vec<RecordedRequest>,
}

/// A request the executor received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub request: HttpRequest,
    pub matched: bool,
}

impl RecordedRequest {
    /// Decoded form parameters from the body and query string
    pub fn form(&self) -> std::collections::HashMap<String, String> {
        let query = self
            .request
            .uri
            .split_once('?')
            .map(|(_, q)| q)
            .unwrap_or("");
        let mut params: std::collections::HashMap<String, String> =
            serde_urlencoded::from_str(query).unwrap_or_default();
        let body: std::collections::HashMap<String, String> =
            serde_urlencoded::from_str(&self.request.body).unwrap_or_default();
        params.extend(body);
        params
    }
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expectation
    pub fn expect(&self, matcher: RequestMatcher) -> ExpectationBuilder {
        ExpectationBuilder {
            executor: self.state.clone(),
            expectation: Some(Expectation::new(matcher)),
        }
    }

    /// All received requests, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Requests that didn't match any expectation
    pub fn unmatched_requests(&self) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| !r.matched).collect()
    }

    /// Verify that all expectations were met
    pub fn verify(&self) {
        let state = self.state.lock().unwrap();
        for exp in &state.expectations {
            if let Err(message) = exp.check() {
                panic!("{}", message);
            }
        }
    }
}

#[async_trait]
impl HttpExecutor for MockExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.state.lock().unwrap();

        // Reverse order so later expectations override earlier ones
        let matching_idx = state
            .expectations
            .iter()
            .enumerate()
            .rev()
            .find(|(_, exp)| exp.matcher.matches(&request))
            .map(|(i, _)| i);

        state.requests.push(RecordedRequest {
            request,
            matched: matching_idx.is_some(),
        });

        match matching_idx {
            Some(idx) => {
                let exp = &mut state.expectations[idx];
                exp.call_count += 1;
                exp.response.to_result()
            }
            None => {
                tracing::debug!("No expectation matched");
                Ok(HttpResponse::new(
                    StatusCode::NOT_FOUND,
                    "No expectation matched",
                ))
            }
        }
    }
}

pub struct ExpectationBuilder {
    executor: Arc<Mutex<ExecutorState>>,
    expectation: Option<Expectation>,
}

impl ExpectationBuilder {
    pub fn respond_with(mut self, response: MockResponse) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            exp.response = response;
        }
        self
    }

    pub fn times(mut self, n: usize) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            exp.times = Times::Exactly(n);
        }
        self
    }

    pub fn once(mut self) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            exp.times = Times::Once;
        }
        self
    }

    pub fn never(mut self) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            exp.times = Times::Exactly(0);
        }
        self
    }

    pub fn at_least(mut self, n: usize) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            exp.times = Times::AtLeast(n);
        }
        self
    }

    pub fn at_most(mut self, n: usize) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            exp.times = Times::AtMost(n);
        }
        self
    }

    pub fn any_times(mut self) -> Self {
        if let Some(exp) = self.expectation.as_mut() {
            exp.times = Times::Any;
        }
        self
    }
}

impl Drop for ExpectationBuilder {
    fn drop(&mut self) {
        if let Some(exp) = self.expectation.take() {
            if let Ok(mut state) = self.executor.lock() {
                state.expectations.push(exp);
            }
        }
    }
}
