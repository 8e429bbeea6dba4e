//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (remote store,
//! local filesystem) into the path/sync core and exposes path-oriented file
//! management through [`DriveService`]. Desktop apps typically enable the
//! `desktop-shims` feature, which lets [`DriveService::from_config`] fall
//! back to the `bridge-desktop` HTTP client and filesystem.
//!
//! ```ignore
//! use core_service::{CoreConfig, DriveService, SyncOptions};
//!
//! let config = CoreConfig::builder().access_token(token).build()?;
//! let drive = DriveService::from_config(config)?;
//!
//! drive.ensure_folder_path("backup/docs").await?;
//! let report = drive
//!     .sync(Path::new("/home/me/docs"), "backup/docs", &drive.sync_options())
//!     .await?;
//! ```

pub mod error;
mod service;

pub use error::{CoreError, Result};
pub use service::{DestPath, DriveService, ServiceSettings};

pub use core_runtime::config::{CoreConfig, ResolutionMode};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use core_sync::{
    AlwaysProceed, ConfirmationPolicy, Decision, ProceedIf, SyncError, SyncOptions, SyncReport,
};

use std::sync::Arc;

use bridge_traits::{remote::RemoteStore, storage::FileSystemAccess};
use provider_google_drive::GoogleDriveConnector;

/// Aggregated handle to the bridge dependencies the core requires.
pub struct CoreDependencies {
    pub remote_store: Arc<dyn RemoteStore>,
    pub filesystem: Arc<dyn FileSystemAccess>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(remote_store: Arc<dyn RemoteStore>, filesystem: Arc<dyn FileSystemAccess>) -> Self {
        Self {
            remote_store,
            filesystem,
        }
    }

    /// Build the bundle from a validated configuration.
    ///
    /// An injected remote store is used as is; otherwise a Drive connector
    /// is created over the configured HTTP client and access token.
    pub fn from_config(config: &CoreConfig) -> Result<Self> {
        let filesystem = config.file_system.clone().ok_or_else(|| {
            CoreError::InitializationFailed("No file system access configured".to_string())
        })?;

        let remote_store: Arc<dyn RemoteStore> = match &config.remote_store {
            Some(store) => Arc::clone(store),
            None => {
                let http_client = config.http_client.clone().ok_or_else(|| {
                    CoreError::InitializationFailed("No HTTP client configured".to_string())
                })?;
                let token = config.access_token.clone().ok_or_else(|| {
                    CoreError::InitializationFailed("No access token configured".to_string())
                })?;
                Arc::new(GoogleDriveConnector::new(
                    http_client,
                    Arc::clone(&filesystem),
                    token,
                ))
            }
        };

        Ok(Self::new(remote_store, filesystem))
    }
}
