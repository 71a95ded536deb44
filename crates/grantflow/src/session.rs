//! Session storage seam
//!
//! The flow keeps exactly one value per authorization attempt (the state
//! token). Values are scoped by flow name so several providers can share one
//! end-user session without colliding.

use std::collections::HashMap;
use std::sync::RwLock;

/// Result type for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Errors raised by a session backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Failed to read from the session.
    #[error("Failed to read session: {0}")]
    ReadError(String),

    /// Failed to write to the session.
    #[error("Failed to write session: {0}")]
    WriteError(String),
}

/// Key/value storage scoped by flow name.
///
/// Implementations own any locking; the flow assumes a single writer per
/// key and scope.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str, scope: &str) -> SessionResult<Option<String>>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: &str, scope: &str) -> SessionResult<()>;

    /// Delete a value. Removing a missing key is not an error.
    fn remove(&self, key: &str, scope: &str) -> SessionResult<()>;

    /// Read a value and delete it.
    fn take(&self, key: &str, scope: &str) -> SessionResult<Option<String>> {
        let value = self.get(key, scope)?;
        if value.is_some() {
            self.remove(key, scope)?;
        }
        Ok(value)
    }
}

/// In-memory session store (single process, development/testing).
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    values: RwLock<HashMap<(String, String), String>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values across all scopes.
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    /// Check whether the store holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str, scope: &str) -> SessionResult<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|e| SessionError::ReadError(format!("Failed to acquire lock: {}", e)))?;

        Ok(values.get(&(scope.to_string(), key.to_string())).cloned())
    }

    fn set(&self, key: &str, value: &str, scope: &str) -> SessionResult<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| SessionError::WriteError(format!("Failed to acquire lock: {}", e)))?;

        values.insert((scope.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str, scope: &str) -> SessionResult<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| SessionError::WriteError(format!("Failed to acquire lock: {}", e)))?;

        values.remove(&(scope.to_string(), key.to_string()));
        Ok(())
    }

    fn take(&self, key: &str, scope: &str) -> SessionResult<Option<String>> {
        let mut values = self
            .values
            .write()
            .map_err(|e| SessionError::WriteError(format!("Failed to acquire lock: {}", e)))?;

        Ok(values.remove(&(scope.to_string(), key.to_string())))
    }
}
