//! Registered client credentials

use std::fmt;

/// The registered OAuth2 client: its id and secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Consumer {
    key: String,
    secret: String,
}

impl Consumer {
    /// Create a consumer from the client id and client secret issued by the provider.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// Get the client id.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the client secret.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("key", &self.key)
            .field("secret", &"***")
            .finish()
    }
}
