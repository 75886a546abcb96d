//! Caller identity.
//!
//! Identity issuance and verification belong to the authentication provider.
//! The pipeline only needs to know whether a usable identity is present and
//! which token to bind requests to.

use std::fmt;

/// An authenticated caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: String,
    token: String,
}

impl Identity {
    /// Create an identity. Returns `None` when either part is blank, which
    /// callers treat the same as no identity at all.
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Option<Self> {
        let user_id = user_id.into();
        let token = token.into();
        if user_id.trim().is_empty() || token.trim().is_empty() {
            return None;
        }
        Some(Self { user_id, token })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

// Tokens must never end up in logs.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}
