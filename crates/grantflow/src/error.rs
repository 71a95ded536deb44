//! Flow errors

use crate::session::SessionError;
use crate::transport::{HttpResponse, TransportError};
use thiserror::Error;

/// Result type for flow operations.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors that end the current authorization attempt.
///
/// None of these are retried by the flow.
#[derive(Debug, Error)]
pub enum FlowError {
    /// No state was stored for this flow (session lost, or the callback was
    /// replayed).
    #[error("Unknown authorization: no state stored for this flow")]
    UnknownAuthorization,

    /// The user declined consent, or the callback carried no code.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The callback carried no `state` parameter.
    #[error("Unknown state: callback has no state parameter")]
    UnknownState,

    /// The callback `state` does not match the stored one.
    #[error("Invalid state - possible CSRF attack")]
    InvalidState,

    /// The token endpoint answered with an empty or unusable body.
    #[error("Invalid access token: {0}")]
    InvalidAccessToken(String),

    /// The token endpoint answered with a non-success status.
    #[error("Invalid response: HTTP {}", .0.status())]
    InvalidResponse(HttpResponse),

    /// The caller broke an operation's contract.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The session backend failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl FlowError {
    /// The response behind an [`FlowError::InvalidResponse`].
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            FlowError::InvalidResponse(response) => Some(response),
            _ => None,
        }
    }
}
