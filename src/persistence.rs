//! Persistence Gateway
//!
//! Port for loading and saving file bytes, plus a local filesystem
//! implementation used by the headless driver.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Failures reported by a persistence backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("network error: {0}")]
    Network(String),
}

impl PersistenceError {
    /// Human readable message for the flash channel
    pub fn to_human(&self) -> String {
        match self {
            PersistenceError::NotFound(path) => {
                format!("The requested file could not be found: {}", path)
            }
            PersistenceError::PermissionDenied(_) => {
                "You do not have permission to perform this action.".to_string()
            }
            PersistenceError::Conflict(path) => format!(
                "The file {} was modified elsewhere, reload it before saving again.",
                path
            ),
            PersistenceError::Network(detail) => format!(
                "A network error occurred while contacting the server: {}",
                detail
            ),
        }
    }
}

/// Loads and saves file contents for a server
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn load_file(&self, server_id: &str, path: &str) -> Result<String, PersistenceError>;

    async fn save_file(
        &self,
        server_id: &str,
        path: &str,
        content: &str,
    ) -> Result<(), PersistenceError>;
}

/// Gateway that reads and writes below a root directory on disk.
///
/// The server id selects nothing here; every server shares the root.
#[derive(Debug, Clone)]
pub struct LocalGateway {
    root: PathBuf,
}

impl LocalGateway {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, PersistenceError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(PersistenceError::PermissionDenied(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn map_io_error(path: &str, err: io::Error) -> PersistenceError {
    match err.kind() {
        io::ErrorKind::NotFound => PersistenceError::NotFound(path.to_string()),
        io::ErrorKind::PermissionDenied => PersistenceError::PermissionDenied(path.to_string()),
        _ => PersistenceError::Network(err.to_string()),
    }
}

#[async_trait]
impl PersistenceGateway for LocalGateway {
    async fn load_file(&self, server_id: &str, path: &str) -> Result<String, PersistenceError> {
        let full_path = self.resolve(path)?;
        log::debug!("[{}] reading {}", server_id, full_path.display());
        tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|e| map_io_error(path, e))
    }

    async fn save_file(
        &self,
        server_id: &str,
        path: &str,
        content: &str,
    ) -> Result<(), PersistenceError> {
        let full_path = self.resolve(path)?;
        log::debug!("[{}] writing {}", server_id, full_path.display());
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io_error(path, e))?;
        }
        tokio::fs::write(&full_path, content)
            .await
            .map_err(|e| map_io_error(path, e))
    }
}
