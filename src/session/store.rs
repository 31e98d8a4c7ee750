// src/session/store.rs

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::AppError;

/// Fixed identifier of the single persisted session slot.
pub const SESSION_KEY: &str = "token";

/// Holds at most one session token.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, AppError>;
    fn save(&self, token: &str) -> Result<(), AppError>;
    fn clear(&self) -> Result<(), AppError>;
}

/// In-process slot; lives as long as the client.
#[derive(Debug, Default)]
pub struct MemoryStore {
    token: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a token already in the slot.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, AppError> {
        Ok(self.token.read().clone())
    }

    fn save(&self, token: &str) -> Result<(), AppError> {
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        self.token.write().take();
        Ok(())
    }
}

/// Keeps the token in `<dir>/token` so it survives between CLI invocations.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_KEY),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> Result<Option<String>, AppError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read session from {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, token: &str) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(&self.path, token).map_err(|e| {
            AppError::Storage(format!(
                "Failed to write session to {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn clear(&self) -> Result<(), AppError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to remove session at {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
