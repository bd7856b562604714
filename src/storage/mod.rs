//! Document-storage collaborator boundary
//!
//! The core only moves opaque [`FileRef`] values; attachment and final
//! document content lives behind this interface.

use axum::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Opaque reference to a stored document
pub type FileRef = String;

/// Storage failures
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("document not found: {0}")]
    NotFound(FileRef),

    #[error("invalid file reference: {0}")]
    InvalidRef(FileRef),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blob store interface
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn store(&self, bytes: Vec<u8>, original_name: &str) -> Result<FileRef, StorageError>;
    async fn retrieve(&self, file_ref: &str) -> Result<Vec<u8>, StorageError>;
}

/// Filesystem-backed store; refs are generated names inside a configured
/// directory and never contain path separators.
pub struct FsDocumentStore {
    root: std::path::PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, file_ref: &str) -> Result<std::path::PathBuf, StorageError> {
        // Refs are single path components; anything else is hostile input.
        if file_ref.is_empty() || file_ref.contains('/') || file_ref.contains("..") {
            return Err(StorageError::InvalidRef(file_ref.to_string()));
        }
        Ok(self.root.join(file_ref))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn store(&self, bytes: Vec<u8>, original_name: &str) -> Result<FileRef, StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let extension = std::path::Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        let file_ref = format!("{}{}", Uuid::new_v4(), extension);

        tokio::fs::write(self.root.join(&file_ref), bytes).await?;
        tracing::debug!(file_ref = %file_ref, original = %original_name, "Document stored");

        Ok(file_ref)
    }

    async fn retrieve(&self, file_ref: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(file_ref)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(file_ref.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
