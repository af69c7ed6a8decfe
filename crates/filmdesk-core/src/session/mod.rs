pub mod store;
pub mod file_store;

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::error::SessionError;

pub use file_store::FileSessionStore;
pub use store::SessionStore;

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the display username.
pub const USERNAME_KEY: &str = "username";

/// The persisted login state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub username: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Process-local session store. Used for one-shot runs and as a test double.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(token: &str, username: &str) -> Self {
        Self {
            inner: Mutex::new(Session {
                token: Some(token.to_string()),
                username: Some(username.to_string()),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        // A poisoned lock still holds a consistent two-field value.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn get_token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    fn get_username(&self) -> Option<String> {
        self.lock().username.clone()
    }

    fn set_session(&self, token: &str, username: &str) -> Result<(), SessionError> {
        let mut session = self.lock();
        session.token = Some(token.to_string());
        session.username = Some(username.to_string());
        Ok(())
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        *self.lock() = Session::default();
        Ok(())
    }
}
