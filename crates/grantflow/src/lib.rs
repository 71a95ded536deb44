//! # grantflow
//!
//! Client side of the OAuth2 "authorization code" grant.
//!
//! The crate covers one authorization attempt from start to finish:
//! building the authorize redirect URL, storing and checking the
//! anti-forgery `state` token, exchanging the returned code (or a refresh
//! token) at the token endpoint, and normalizing the provider's answer
//! into an [`AccessToken`].
//!
//! Transport and session storage are injected through the [`HttpExecutor`]
//! and [`SessionStore`] traits, so the flow itself performs no I/O of its own.
//!
//! ## Features
//!
//! - `reqwest` - [`ReqwestExecutor`], an [`HttpExecutor`] backed by `reqwest`
//!
//! ## Example
//!
//! ```rust,ignore
//! use grantflow::{AuthorizationCodeFlow, Consumer, FlowConfig, InMemorySessionStore, ProviderConfig};
//! use std::sync::Arc;
//!
//! let config = FlowConfig::new(
//!     ProviderConfig::github(),
//!     Consumer::new("client_id", "client_secret"),
//!     "https://myapp.com/auth/callback",
//! )
//! .scope("read:user");
//!
//! let flow = AuthorizationCodeFlow::new(config, Arc::new(executor), Arc::new(InMemorySessionStore::new()));
//!
//! // Redirect the user here
//! let url = flow.authorization_url()?;
//!
//! // On the redirect back to the callback URI
//! let token = flow.complete(&callback_params).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod config;
mod consumer;
mod error;
mod flow;
mod provider;
mod session;
mod state;
mod token;
mod transport;

pub use config::FlowConfig;
pub use consumer::Consumer;
pub use error::{FlowError, Result};
pub use flow::{AuthorizationCodeFlow, CallbackParameters, STATE_SESSION_KEY};
pub use provider::{ProviderConfig, TokenFormat};
pub use session::{InMemorySessionStore, SessionError, SessionResult, SessionStore};
pub use state::StateToken;
pub use token::AccessToken;
pub use transport::{HttpExecutor, HttpRequest, HttpResponse, TransportError};

#[cfg(feature = "reqwest")]
pub use transport::reqwest_executor::ReqwestExecutor;
