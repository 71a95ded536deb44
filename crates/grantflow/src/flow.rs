//! The authorization code state machine
//!
//! ```text
//! build_authorization_url ──► (user consents at the provider)
//!         │ stores state            │
//!         ▼                         ▼
//!     session ──────────► complete_authorization(callback)
//!                                   │ validates state / code
//!                                   ▼
//!                         exchange_code_for_token ──► parse_token_response
//! ```
//!
//! `refresh_token` goes straight to the token endpoint and never touches
//! the session.

use crate::config::FlowConfig;
use crate::error::{FlowError, Result};
use crate::session::SessionStore;
use crate::state::StateToken;
use crate::token::AccessToken;
use crate::transport::{HttpExecutor, HttpRequest};
use http::{header, Method};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Session key under which the state token is stored.
pub const STATE_SESSION_KEY: &str = "oauth2_state";

/// Query parameters received on the redirect URI.
pub type CallbackParameters = HashMap<String, String>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// One provider's authorization code flow.
#[derive(Clone)]
pub struct AuthorizationCodeFlow {
    config: FlowConfig,
    executor: Arc<dyn HttpExecutor>,
    session: Arc<dyn SessionStore>,
}

impl AuthorizationCodeFlow {
    /// Create a flow from its configuration and collaborators.
    pub fn new(
        config: FlowConfig,
        executor: Arc<dyn HttpExecutor>,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            executor,
            session,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Flow name, used as the session scope.
    pub fn name(&self) -> &str {
        &self.config.provider.name
    }

    /// Build the URL the user is redirected to.
    ///
    /// Unless `stateless` is set, a fresh [`StateToken`] is written to the
    /// session (one write) and added as `state`. `scope` entries are joined
    /// with the provider's delimiter. Core parameters win over
    /// `extra_parameters` with the same name.
    pub fn build_authorization_url(
        &self,
        extra_parameters: &[(&str, &str)],
        scope: &[&str],
        stateless: bool,
    ) -> Result<String> {
        let mut params: Vec<(String, String)> = Vec::with_capacity(extra_parameters.len() + 5);
        for (name, value) in extra_parameters {
            set_param(&mut params, name, value);
        }

        set_param(&mut params, "client_id", self.config.consumer.key());
        set_param(&mut params, "redirect_uri", &self.config.redirect_uri);
        set_param(&mut params, "response_type", "code");

        if !stateless {
            let state = StateToken::generate();
            self.session
                .set(STATE_SESSION_KEY, state.as_str(), self.name())?;
            set_param(&mut params, "state", state.as_str());
        }

        if !scope.is_empty() {
            let joined = scope.join(self.config.provider.scope_delimiter.as_str());
            set_param(&mut params, "scope", &joined);
        }

        let query = encode_form(&params)?;
        let url = append_query(&self.config.provider.authorize_uri, &query);

        tracing::debug!(
            flow = %self.name(),
            stateless,
            scopes = scope.len(),
            "Built authorization URL"
        );

        Ok(url)
    }

    /// [`build_authorization_url`](Self::build_authorization_url) with the
    /// configured default scopes and mode.
    pub fn authorization_url(&self) -> Result<String> {
        let scopes: Vec<&str> = self.config.scopes.iter().map(String::as_str).collect();
        self.build_authorization_url(&[], &scopes, self.config.stateless)
    }

    /// Validate the provider's callback and exchange its code.
    ///
    /// Checks run in this order:
    /// 1. stateful only: a state must be stored for this flow, else
    ///    [`FlowError::UnknownAuthorization`]. The stored value is consumed.
    /// 2. `error=access_denied` fails with [`FlowError::Unauthorized`].
    /// 3. stateful only: a missing `state` fails with [`FlowError::UnknownState`].
    /// 4. stateful only: a different `state` fails with [`FlowError::InvalidState`].
    /// 5. a missing or empty `code` fails with [`FlowError::Unauthorized`].
    pub async fn complete_authorization(
        &self,
        callback_params: &CallbackParameters,
        stateless: bool,
    ) -> Result<AccessToken> {
        let stored = if stateless {
            None
        } else {
            match self.session.take(STATE_SESSION_KEY, self.name())? {
                Some(state) if !state.is_empty() => Some(StateToken::new(state)),
                _ => {
                    tracing::warn!(flow = %self.name(), "Callback without a stored state");
                    return Err(FlowError::UnknownAuthorization);
                }
            }
        };

        if callback_params.get("error").map(String::as_str) == Some("access_denied") {
            tracing::warn!(flow = %self.name(), "User denied access");
            return Err(FlowError::Unauthorized("access denied by user".to_string()));
        }

        if let Some(stored) = stored {
            let received = callback_params
                .get("state")
                .ok_or(FlowError::UnknownState)?;
            if !stored.verify(received) {
                tracing::warn!(flow = %self.name(), "Callback state mismatch");
                return Err(FlowError::InvalidState);
            }
        }

        let code = match callback_params.get("code").filter(|code| !code.is_empty()) {
            Some(code) => code,
            None => {
                let reason = match callback_params.get("error") {
                    Some(error) => format!("missing code (provider error: {})", error),
                    None => "missing code".to_string(),
                };
                tracing::warn!(flow = %self.name(), "Callback without a code");
                return Err(FlowError::Unauthorized(reason));
            }
        };

        self.exchange_code_for_token(code).await
    }

    /// [`complete_authorization`](Self::complete_authorization) in the configured mode.
    pub async fn complete(&self, callback_params: &CallbackParameters) -> Result<AccessToken> {
        self.complete_authorization(callback_params, self.config.stateless)
            .await
    }

    /// Exchange an authorization code for an access token.
    pub async fn exchange_code_for_token(&self, code: &str) -> Result<AccessToken> {
        if code.is_empty() {
            return Err(FlowError::InvalidArgument(
                "authorization code must not be empty",
            ));
        }

        let consumer = &self.config.consumer;
        let params = [
            ("client_id", consumer.key()),
            ("client_secret", consumer.secret()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        self.token_request(&params).await
    }

    /// Obtain a new access token with a refresh token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<AccessToken> {
        if refresh_token.is_empty() {
            return Err(FlowError::InvalidArgument("refresh token must not be empty"));
        }

        let consumer = &self.config.consumer;
        let params = [
            ("client_id", consumer.key()),
            ("client_secret", consumer.secret()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        self.token_request(&params).await
    }

    /// Parse a token endpoint body with the provider's token format.
    pub fn parse_token_response(&self, body: &str) -> Result<AccessToken> {
        AccessToken::parse(body, self.config.provider.token_format)
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<AccessToken> {
        let provider = &self.config.provider;
        let grant_type = params
            .iter()
            .find(|(name, _)| *name == "grant_type")
            .map(|(_, value)| *value)
            .unwrap_or_default();

        let form = encode_form(params)?;
        let request = if provider.token_method == Method::GET {
            HttpRequest::new(Method::GET, append_query(&provider.token_uri, &form))
        } else {
            HttpRequest::new(provider.token_method.clone(), provider.token_uri.as_str())
                .body(form)
        }
        .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
        .header(header::ACCEPT, provider.token_format.accept());

        tracing::debug!(
            flow = %self.name(),
            grant_type,
            method = %provider.token_method,
            "Requesting token"
        );

        let response = match self.executor.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(flow = %self.name(), grant_type, error = %e, "Token request failed");
                return Err(e.into());
            }
        };

        if !response.is_success() {
            tracing::warn!(
                flow = %self.name(),
                grant_type,
                status = response.status().as_u16(),
                "Token endpoint rejected request"
            );
            return Err(FlowError::InvalidResponse(response));
        }

        let token = self.parse_token_response(response.body())?;
        tracing::info!(flow = %self.name(), grant_type, "Access token obtained");
        Ok(token)
    }
}

impl fmt::Debug for AuthorizationCodeFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationCodeFlow")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn set_param(params: &mut Vec<(String, String)>, name: &str, value: &str) {
    match params.iter_mut().find(|(existing, _)| existing == name) {
        Some(param) => param.1 = value.to_string(),
        None => params.push((name.to_string(), value.to_string())),
    }
}

fn encode_form<K: AsRef<str>, V: AsRef<str>>(params: &[(K, V)]) -> Result<String> {
    let pairs: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .collect();
    serde_urlencoded::to_string(pairs)
        .map_err(|_| FlowError::InvalidArgument("parameters are not form-encodable"))
}

fn append_query(uri: &str, query: &str) -> String {
    if query.is_empty() {
        return uri.to_string();
    }
    let separator = if uri.ends_with('?') || uri.ends_with('&') {
        ""
    } else if uri.contains('?') {
        "&"
    } else {
        "?"
    };
    format!("{}{}{}", uri, separator, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::Consumer;
    use crate::provider::ProviderConfig;
    use crate::session::InMemorySessionStore;
    use crate::transport::{HttpResponse, TransportError};
    use async_trait::async_trait;
    use http::StatusCode;
    use std::sync::Mutex;

    /// Answers every request with the same response and records what it saw.
    struct CannedExecutor {
        response: HttpResponse,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl CannedExecutor {
        fn ok(body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: HttpResponse::new(StatusCode::OK, body),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpExecutor for CannedExecutor {
        async fn execute(
            &self,
            request: HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            Ok(self.response.clone())
        }
    }

    fn provider() -> ProviderConfig {
        ProviderConfig::new(
            "acme",
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
        )
    }

    fn flow_with(
        provider: ProviderConfig,
        executor: Arc<CannedExecutor>,
    ) -> (AuthorizationCodeFlow, Arc<InMemorySessionStore>) {
        let session = Arc::new(InMemorySessionStore::new());
        let config = FlowConfig::new(
            provider,
            Consumer::new("client id", "s3cret"),
            "https://app.example.com/callback",
        );
        (
            AuthorizationCodeFlow::new(config, executor, session.clone()),
            session,
        )
    }

    fn query_of(url: &str) -> HashMap<String, String> {
        let (_, query) = url.split_once('?').unwrap();
        serde_urlencoded::from_str(query).unwrap()
    }

    fn callback(pairs: &[(&str, &str)]) -> CallbackParameters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_authorization_url_parameters() {
        let (flow, session) = flow_with(provider(), CannedExecutor::ok(""));
        let url = flow
            .build_authorization_url(&[("display", "popup")], &["read", "write"], false)
            .unwrap();

        assert!(url.starts_with("https://auth.example.com/authorize?"));
        let query = query_of(&url);
        assert_eq!(query["client_id"], "client id");
        assert_eq!(query["redirect_uri"], "https://app.example.com/callback");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["scope"], "read,write");
        assert_eq!(query["display"], "popup");

        let stored = session.get(STATE_SESSION_KEY, "acme").unwrap().unwrap();
        assert_eq!(query["state"], stored);
        assert_eq!(stored.len(), 32);
    }

    #[test]
    fn test_authorization_url_stateless() {
        let (flow, session) = flow_with(provider(), CannedExecutor::ok(""));
        let url = flow.build_authorization_url(&[], &[], true).unwrap();

        let query = query_of(&url);
        assert!(!query.contains_key("state"));
        assert!(!query.contains_key("scope"));
        assert!(session.is_empty());
    }

    #[test]
    fn test_core_parameters_override_extras() {
        let (flow, _) = flow_with(provider(), CannedExecutor::ok(""));
        let url = flow
            .build_authorization_url(
                &[("client_id", "evil"), ("response_type", "token")],
                &[],
                true,
            )
            .unwrap();

        let query = query_of(&url);
        assert_eq!(query["client_id"], "client id");
        assert_eq!(query["response_type"], "code");
    }

    #[test]
    fn test_scope_delimiter_and_existing_query() {
        let provider = ProviderConfig::new(
            "acme",
            "https://auth.example.com/authorize?tenant=common",
            "https://auth.example.com/token",
        )
        .scope_delimiter(" ");
        let (flow, _) = flow_with(provider, CannedExecutor::ok(""));
        let url = flow
            .build_authorization_url(&[], &["openid", "email"], true)
            .unwrap();

        assert!(url.starts_with("https://auth.example.com/authorize?tenant=common&"));
        assert_eq!(query_of(&url)["scope"], "openid email");
    }

    #[test]
    fn test_append_query() {
        assert_eq!(append_query("https://a.test/x", "a=1"), "https://a.test/x?a=1");
        assert_eq!(append_query("https://a.test/x?", "a=1"), "https://a.test/x?a=1");
        assert_eq!(append_query("https://a.test/x?b=2", "a=1"), "https://a.test/x?b=2&a=1");
        assert_eq!(append_query("https://a.test/x", ""), "https://a.test/x");
    }

    #[tokio::test]
    async fn test_complete_exchanges_code() {
        let executor = CannedExecutor::ok("access_token=abc123&token_type=bearer");
        let (flow, _) = flow_with(provider(), executor.clone());

        let url = flow.build_authorization_url(&[], &[], false).unwrap();
        let state = query_of(&url)["state"].clone();

        let token = flow
            .complete_authorization(
                &callback(&[("state", state.as_str()), ("code", "the-code")]),
                false,
            )
            .await
            .unwrap();
        assert_eq!(token.access_token(), "abc123");

        let requests = executor.requests();
        assert_eq!(requests.len(), 1);
        let body: HashMap<String, String> = serde_urlencoded::from_str(&requests[0].body).unwrap();
        assert_eq!(body["code"], "the-code");
        assert_eq!(body["grant_type"], "authorization_code");
        assert_eq!(body["client_secret"], "s3cret");
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(
            requests[0].headers.get(header::CONTENT_TYPE).unwrap(),
            FORM_CONTENT_TYPE
        );
    }

    #[tokio::test]
    async fn test_access_denied_checked_before_state() {
        let (flow, _) = flow_with(provider(), CannedExecutor::ok("access_token=abc"));
        let url = flow.build_authorization_url(&[], &[], false).unwrap();
        let state = query_of(&url)["state"].clone();

        let result = flow
            .complete_authorization(
                &callback(&[("error", "access_denied"), ("state", state.as_str())]),
                false,
            )
            .await;
        assert!(matches!(result, Err(FlowError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_stateless_skips_state_checks() {
        let executor = CannedExecutor::ok("access_token=abc");
        let (flow, _) = flow_with(provider(), executor.clone());

        let token = flow
            .complete_authorization(&callback(&[("code", "c")]), true)
            .await
            .unwrap();
        assert_eq!(token.access_token(), "abc");

        let denied = flow
            .complete_authorization(&callback(&[("error", "access_denied")]), true)
            .await;
        assert!(matches!(denied, Err(FlowError::Unauthorized(_))));

        let no_code = flow.complete_authorization(&callback(&[]), true).await;
        assert!(matches!(no_code, Err(FlowError::Unauthorized(_))));
        assert_eq!(executor.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_get_token_method_uses_query_string() {
        let executor = CannedExecutor::ok("access_token=abc");
        let (flow, _) = flow_with(provider().token_method(Method::GET), executor.clone());

        flow.exchange_code_for_token("c0de").await.unwrap();

        let request = &executor.requests()[0];
        assert_eq!(request.method, Method::GET);
        assert!(request.body.is_empty());
        let query = query_of(&request.uri);
        assert_eq!(query["code"], "c0de");
        assert_eq!(query["grant_type"], "authorization_code");
    }

    #[tokio::test]
    async fn test_empty_code_is_caller_error() {
        let executor = CannedExecutor::ok("access_token=abc");
        let (flow, _) = flow_with(provider(), executor.clone());

        assert!(matches!(
            flow.exchange_code_for_token("").await,
            Err(FlowError::InvalidArgument(_))
        ));
        assert!(matches!(
            flow.refresh_token("").await,
            Err(FlowError::InvalidArgument(_))
        ));
        assert!(executor.requests().is_empty());
    }
}
