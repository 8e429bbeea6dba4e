//! Local file system abstraction
//!
//! The synchronizer only ever reads the local tree: classification, stat,
//! directory listing and a readability probe before upload.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Kind of a local directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalEntryKind {
    File,
    Directory,
    /// Sockets, FIFOs, devices and anything else that is neither
    Other,
}

/// File metadata information
#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub kind: LocalEntryKind,
    pub size: u64,
    /// Modification time, already converted to UTC
    pub modified_at: Option<DateTime<Utc>>,
}

impl FileMetadata {
    pub fn is_file(&self) -> bool {
        self.kind == LocalEntryKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == LocalEntryKind::Directory
    }
}

/// File system access trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn total_size(fs: &dyn FileSystemAccess, dir: &Path) -> Result<u64> {
///     let mut total = 0;
///     for entry in fs.list_directory(dir).await? {
///         total += fs.metadata(&entry).await?.size;
///     }
///     Ok(total)
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Stat a path, following symlinks
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// List the entries of a directory as full paths (`dir.join(name)`)
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Whether the current user can open the file for reading
    async fn is_readable(&self, path: &Path) -> Result<bool>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &Path) -> Result<Bytes>;
}
