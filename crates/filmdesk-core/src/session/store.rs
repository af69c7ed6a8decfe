use crate::error::SessionError;

use super::Session;

/// Trait for session storage backends.
///
/// Reads never fail: an unreadable backend is an absent session. No check is
/// made on token shape or expiry, the server decides when a token is dead.
pub trait SessionStore: Send + Sync {
    /// Current bearer token, if any.
    fn get_token(&self) -> Option<String>;

    /// Display name saved at login.
    fn get_username(&self) -> Option<String>;

    /// Store both entries, replacing whatever was there.
    fn set_session(&self, token: &str, username: &str) -> Result<(), SessionError>;

    /// Remove both entries. Calling it on an empty store is a no-op.
    fn clear_session(&self) -> Result<(), SessionError>;

    /// Snapshot of both entries.
    fn load(&self) -> Session {
        Session {
            token: self.get_token(),
            username: self.get_username(),
        }
    }
}
