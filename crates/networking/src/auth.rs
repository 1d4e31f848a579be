//! Session provider
//!
//! Credentials are issued and refreshed elsewhere; this crate only reads the
//! current bearer token and the language id stored on the user's account.

use parking_lot::RwLock;
use std::sync::Arc;

/// Source of the signed-in user's credentials
pub trait SessionProvider: Send + Sync {
    /// Current bearer token, if signed in
    fn bearer_token(&self) -> Option<String>;

    /// Language id confirmed by the backend for the signed-in user
    fn language_id(&self) -> Option<String>;
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    language_id: Option<String>,
}

/// Shared, mutable session state
///
/// Clones share the same state, so the handle given to the fetcher sees
/// sign-in and sign-out performed through any other clone.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    state: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    /// Create a signed-out session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a signed-in session
    pub fn signed_in(token: impl Into<String>, language_id: Option<String>) -> Self {
        let handle = Self::new();
        handle.set_credentials(token, language_id);
        handle
    }

    /// Replace the credentials
    pub fn set_credentials(&self, token: impl Into<String>, language_id: Option<String>) {
        let mut state = self.state.write();
        state.token = Some(token.into());
        state.language_id = language_id;
    }

    /// Record a language id confirmed by the backend
    pub fn set_language_id(&self, language_id: Option<String>) {
        self.state.write().language_id = language_id;
    }

    /// Whether a token is present
    pub fn is_signed_in(&self) -> bool {
        self.state.read().token.is_some()
    }

    /// Forget all credentials
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.token = None;
        state.language_id = None;
    }
}

impl SessionProvider for SessionHandle {
    fn bearer_token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    fn language_id(&self) -> Option<String> {
        self.state.read().language_id.clone()
    }
}
