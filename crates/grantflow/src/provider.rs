//! OAuth2 provider endpoints
//!
//! A provider is described by data, not by a type hierarchy: the flow only
//! needs the two endpoint URIs plus a few knobs for providers that deviate
//! from the baseline protocol.

use http::Method;
use serde::{Deserialize, Serialize};

/// Encoding of the token endpoint's response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFormat {
    /// `application/x-www-form-urlencoded` key/value pairs (the baseline).
    #[default]
    Form,
    /// A JSON object.
    Json,
}

impl TokenFormat {
    /// The `Accept` header value matching this format.
    pub fn accept(&self) -> &'static str {
        match self {
            TokenFormat::Form => "application/x-www-form-urlencoded",
            TokenFormat::Json => "application/json",
        }
    }
}

/// Endpoints and protocol details of one OAuth2 provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Flow name. Session entries are scoped by it.
    pub name: String,
    /// Authorization endpoint the user is redirected to.
    pub authorize_uri: String,
    /// Token endpoint used for code exchange and refresh.
    pub token_uri: String,
    /// HTTP method for token requests.
    #[serde(with = "method_serde", default = "default_method")]
    pub token_method: Method,
    /// Separator placed between scopes in the authorize URL.
    #[serde(default = "default_scope_delimiter")]
    pub scope_delimiter: String,
    /// Encoding of the token endpoint response.
    #[serde(default)]
    pub token_format: TokenFormat,
}

fn default_method() -> Method {
    Method::POST
}

fn default_scope_delimiter() -> String {
    ",".to_string()
}

impl ProviderConfig {
    /// Create a provider with the baseline protocol settings: `POST` token
    /// requests, comma-separated scopes and form-encoded token responses.
    pub fn new(
        name: impl Into<String>,
        authorize_uri: impl Into<String>,
        token_uri: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            authorize_uri: authorize_uri.into(),
            token_uri: token_uri.into(),
            token_method: default_method(),
            scope_delimiter: default_scope_delimiter(),
            token_format: TokenFormat::Form,
        }
    }

    /// GitHub OAuth apps.
    pub fn github() -> Self {
        Self::new(
            "github",
            "https://github.com/login/oauth/authorize",
            "https://github.com/login/oauth/access_token",
        )
    }

    /// Google OAuth2.
    pub fn google() -> Self {
        Self::new(
            "google",
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
        )
        .scope_delimiter(" ")
        .token_format(TokenFormat::Json)
    }

    /// Microsoft identity platform (common tenant).
    pub fn microsoft() -> Self {
        Self::new(
            "microsoft",
            "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            "https://login.microsoftonline.com/common/oauth2/v2.0/token",
        )
        .scope_delimiter(" ")
        .token_format(TokenFormat::Json)
    }

    /// Discord OAuth2.
    pub fn discord() -> Self {
        Self::new(
            "discord",
            "https://discord.com/api/oauth2/authorize",
            "https://discord.com/api/oauth2/token",
        )
        .scope_delimiter(" ")
        .token_format(TokenFormat::Json)
    }

    /// Set the HTTP method used for token requests.
    pub fn token_method(mut self, method: Method) -> Self {
        self.token_method = method;
        self
    }

    /// Set the scope separator.
    pub fn scope_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.scope_delimiter = delimiter.into();
        self
    }

    /// Set the token response format.
    pub fn token_format(mut self, format: TokenFormat) -> Self {
        self.token_format = format;
        self
    }
}

mod method_serde {
    use http::Method;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(method.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Method, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Method::from_bytes(raw.to_ascii_uppercase().as_bytes()).map_err(D::Error::custom)
    }
}
