//! Anti-forgery state tokens

use rand::{rngs::OsRng, RngCore};
use std::fmt;
use subtle::ConstantTimeEq;

/// Number of random bytes in a state token.
const STATE_BYTES: usize = 16;

/// Opaque anti-CSRF nonce bound to one authorization attempt.
///
/// Generated from the operating system's CSPRNG and hex encoded, so the
/// string form is always 32 lowercase hex characters.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StateToken(String);

impl StateToken {
    /// Generate a new random state token.
    pub fn generate() -> Self {
        let mut bytes = [0u8; STATE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wrap a state value read back from storage.
    pub fn new(state: impl Into<String>) -> Self {
        Self(state.into())
    }

    /// Get the state value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check a received state value against this one.
    ///
    /// Compared in constant time for equal-length inputs; a length mismatch
    /// is rejected immediately.
    pub fn verify(&self, received: &str) -> bool {
        self.0.as_bytes().ct_eq(received.as_bytes()).into()
    }
}

impl fmt::Debug for StateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateToken").field(&"***").finish()
    }
}

impl fmt::Display for StateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
