use bridge_traits::BridgeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("No object found at '{0}'")]
    NotFound(String),

    #[error("'{0}' is not a folder")]
    NotAFolder(String),

    #[error("Empty folder path or path segment in '{0}'")]
    EmptyPath(String),

    #[error("Folder provisioning requires a parent folder id")]
    NoParent,

    #[error("Local path not found: {0}")]
    LocalPathNotFound(PathBuf),

    #[error("Local path is neither a regular file nor a directory: {0}")]
    UnsupportedLocalEntry(PathBuf),

    #[error("Local file is not readable: {0}")]
    LocalFileUnreadable(PathBuf),

    #[error("Local file system error at {path}: {source}")]
    LocalAccess {
        path: PathBuf,
        #[source]
        source: BridgeError,
    },

    #[error("{count} objects named '{name}' under parent {parent_id}")]
    AmbiguousMatch {
        parent_id: String,
        name: String,
        count: usize,
    },

    #[error("Invalid name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Aborted by confirmation policy at '{0}'")]
    Aborted(String),

    #[error("Remote operation failed: {0}")]
    RemoteOperationFailed(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
