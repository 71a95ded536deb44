//! Flow configuration

use crate::consumer::Consumer;
use crate::provider::ProviderConfig;

/// Configuration for one authorization code flow.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// The provider endpoints.
    pub(crate) provider: ProviderConfig,
    /// Client credentials.
    pub(crate) consumer: Consumer,
    /// Redirect URI registered with the provider.
    pub(crate) redirect_uri: String,
    /// Scopes requested when the caller passes none.
    pub(crate) scopes: Vec<String>,
    /// Default mode for [`authorization_url`](crate::AuthorizationCodeFlow::authorization_url)
    /// and [`complete`](crate::AuthorizationCodeFlow::complete).
    pub(crate) stateless: bool,
}

impl FlowConfig {
    /// Create a configuration with no default scopes, in stateful mode.
    pub fn new(
        provider: ProviderConfig,
        consumer: Consumer,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            consumer,
            redirect_uri: redirect_uri.into(),
            scopes: Vec::new(),
            stateless: false,
        }
    }

    /// Add a default scope. Duplicates are ignored.
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    /// Set the default scopes (replaces existing).
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Vec::new();
        for scope in scopes {
            self = self.scope(scope);
        }
        self
    }

    /// Skip server-side state storage by default.
    pub fn stateless(mut self, stateless: bool) -> Self {
        self.stateless = stateless;
        self
    }

    /// Get the provider.
    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    /// Get the consumer.
    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    /// Get the redirect URI.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Get the default scopes.
    pub fn get_scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Check whether stateless mode is the default.
    pub fn is_stateless(&self) -> bool {
        self.stateless
    }
}
