use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

use crate::error::SessionError;

use super::store::SessionStore;
use super::{TOKEN_KEY, USERNAME_KEY};

type Entries = Map<String, Value>;

/// File-backed key-value session store.
///
/// The file is a flat JSON object. Only the token and username keys are owned
/// by this store; anything else in the file, whatever its type, is left
/// alone. On unix the file is readable by its owner only.
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Entries {
        if !self.path.exists() {
            return Entries::new();
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read session file {}: {}", self.path.display(), e);
                return Entries::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                Entries::new()
            }
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), SessionError> {
        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(SessionError::Write(e.to_string())),
            };
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::Write(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| SessionError::Write(e.to_string()))?;
        write_private(&self.path, json.as_bytes()).map_err(|e| SessionError::Write(e.to_string()))
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.read_entries().remove(key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

/// Write `data` to `path`, owner read/write only on unix.
fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies to new files; tighten an existing one too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(data)?;
    file.sync_all()
}

impl SessionStore for FileSessionStore {
    fn get_token(&self) -> Option<String> {
        self.get(TOKEN_KEY)
    }

    fn get_username(&self) -> Option<String> {
        self.get(USERNAME_KEY)
    }

    fn set_session(&self, token: &str, username: &str) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_entries();
        entries.insert(TOKEN_KEY.to_string(), Value::from(token));
        entries.insert(USERNAME_KEY.to_string(), Value::from(username));
        self.write_entries(&entries)
    }

    fn clear_session(&self) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut entries = self.read_entries();
        let had_token = entries.remove(TOKEN_KEY).is_some();
        let had_user = entries.remove(USERNAME_KEY).is_some();
        if !had_token && !had_user {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}
