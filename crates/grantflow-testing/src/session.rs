use grantflow::{InMemorySessionStore, SessionResult, SessionStore};
use std::sync::Mutex;

/// A session operation seen by [`SessionSpy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOp {
    Get { key: String, scope: String },
    Set { key: String, value: String, scope: String },
    Remove { key: String, scope: String },
}

/// In-memory session store that records every operation
#[derive(Debug, Default)]
pub struct SessionSpy {
    inner: InMemorySessionStore,
    ops: Mutex<Vec<SessionOp>>,
}

impl SessionSpy {
    pub fn new() -> Self {
        Self::default()
    }

    /// All operations, in order
    pub fn ops(&self) -> Vec<SessionOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Number of writes
    pub fn writes(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, SessionOp::Set { .. }))
            .count()
    }

    /// Value currently stored, bypassing the recorder
    pub fn peek(&self, key: &str, scope: &str) -> Option<String> {
        self.inner.get(key, scope).ok().flatten()
    }

    fn record(&self, op: SessionOp) {
        if let Ok(mut ops) = self.ops.lock() {
            ops.push(op);
        }
    }
}

impl SessionStore for SessionSpy {
    fn get(&self, key: &str, scope: &str) -> SessionResult<Option<String>> {
        self.record(SessionOp::Get {
            key: key.to_string(),
            scope: scope.to_string(),
        });
        self.inner.get(key, scope)
    }

    fn set(&self, key: &str, value: &str, scope: &str) -> SessionResult<()> {
        self.record(SessionOp::Set {
            key: key.to_string(),
            value: value.to_string(),
            scope: scope.to_string(),
        });
        self.inner.set(key, value, scope)
    }

    fn remove(&self, key: &str, scope: &str) -> SessionResult<()> {
        self.record(SessionOp::Remove {
            key: key.to_string(),
            scope: scope.to_string(),
        });
        self.inner.remove(key, scope)
    }
}
