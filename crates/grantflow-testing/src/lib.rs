//! Testing utilities for grantflow
//!
//! [`MockExecutor`] stands in for the provider's token endpoint: register
//! expectations, run the flow, then [`verify`](MockExecutor::verify) call
//! counts. [`SessionSpy`] records every session operation.

pub mod executor;
pub mod expectation;
pub mod matcher;
pub mod session;

pub use executor::{ExpectationBuilder, MockExecutor, RecordedRequest};
pub use expectation::{Expectation, MockResponse, Times};
pub use matcher::RequestMatcher;
pub use session::{SessionOp, SessionSpy};
