//! # Core Configuration Module
//!
//! The configuration system uses a builder to construct a `CoreConfig` that
//! holds the injected bridges and the resolution/sync settings. It enforces
//! fail-fast validation so a misconfigured mirror never issues a request.
//!
//! ## Required
//!
//! - `access_token`, unless a ready-made `RemoteStore` is injected
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `FileSystemAccess` - local tree access (desktop default: tokio fs)
//! - `RemoteStore` - replaces the Drive connector entirely (tests, other stores)
//!
//! When the `desktop-shims` feature is enabled, the desktop adapters are
//! injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, ResolutionMode};
//!
//! let config = CoreConfig::builder()
//!     .access_token(token)
//!     .page_size(200)
//!     .resolution_mode(ResolutionMode::Strict)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{FileSystemAccess, HttpClient, RemoteStore};
use std::sync::Arc;

/// Identifier of the Drive root alias
pub const DEFAULT_ROOT_FOLDER_ID: &str = "root";

/// Default number of objects requested per listing page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page size the Drive API accepts
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Default recursion bound for tree synchronization
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// How a lookup that returns several same-named children is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionMode {
    /// Take the first object the store returns
    #[default]
    FirstMatch,
    /// Fail with an ambiguity error
    Strict,
}

/// Core configuration for the mirror.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// OAuth 2.0 bearer token for the Drive API
    pub access_token: Option<String>,

    /// HTTP client for making API requests (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Local file system access (optional with desktop default)
    pub file_system: Option<Arc<dyn FileSystemAccess>>,

    /// Pre-built remote store; when set, no connector is created
    pub remote_store: Option<Arc<dyn RemoteStore>>,

    /// Identifier every path walk starts from
    pub root_folder_id: String,

    pub page_size: u32,

    /// Cap on items collected by one listing; `None` means unbounded
    pub list_item_limit: Option<usize>,

    pub max_depth: usize,

    pub resolution_mode: ResolutionMode,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "file_system",
                &self
                    .file_system
                    .as_ref()
                    .map(|_| "FileSystemAccess { ... }"),
            )
            .field(
                "remote_store",
                &self.remote_store.as_ref().map(|_| "RemoteStore { ... }"),
            )
            .field("root_folder_id", &self.root_folder_id)
            .field("page_size", &self.page_size)
            .field("list_item_limit", &self.list_item_limit)
            .field("max_depth", &self.max_depth)
            .field("resolution_mode", &self.resolution_mode)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - A credential or a remote store is present
    /// - Root folder id is not empty
    /// - Page size is within the API bounds
    /// - The listing item limit, if set, is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.remote_store.is_none() {
            match self.access_token.as_deref() {
                None => {
                    return Err(Error::Config(
                        "Access token is required. Use .access_token() to set it, \
                         or inject a RemoteStore with .remote_store()."
                            .to_string(),
                    ))
                }
                Some(token) if token.trim().is_empty() => {
                    return Err(Error::Config("Access token cannot be empty".to_string()))
                }
                Some(_) => {}
            }
        }

        if self.root_folder_id.trim().is_empty() {
            return Err(Error::Config("Root folder id cannot be empty".to_string()));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }

        if self.list_item_limit == Some(0) {
            return Err(Error::Config(
                "List item limit must be greater than 0 (omit it for no limit)".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn capability_missing(capability: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: format!(
            "{} implementation is required. Desktop: enable the 'desktop-shims' feature \
             to use the default adapter, or inject one through the builder.",
            capability
        ),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new()?);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(capability_missing("HttpClient"))
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem::new());
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(capability_missing("FileSystemAccess"))
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    access_token: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    remote_store: Option<Arc<dyn RemoteStore>>,
    root_folder_id: Option<String>,
    page_size: Option<u32>,
    list_item_limit: Option<usize>,
    max_depth: Option<usize>,
    resolution_mode: ResolutionMode,
}

impl CoreConfigBuilder {
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Inject a remote store. The HTTP client is then never required.
    pub fn remote_store(mut self, store: Arc<dyn RemoteStore>) -> Self {
        self.remote_store = Some(store);
        self
    }

    /// Start path resolution somewhere other than `"root"` (e.g. a shared drive)
    pub fn root_folder_id(mut self, id: impl Into<String>) -> Self {
        self.root_folder_id = Some(id.into());
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn list_item_limit(mut self, limit: usize) -> Self {
        self.list_item_limit = Some(limit);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn resolution_mode(mut self, mode: ResolutionMode) -> Self {
        self.resolution_mode = mode;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// Returns an error if:
    /// - Neither an access token nor a remote store is provided
    /// - A required bridge is missing and no desktop default is available
    /// - A setting is out of range
    pub fn build(self) -> Result<CoreConfig> {
        let http_client = match (self.http_client, &self.remote_store) {
            (Some(client), _) => Some(client),
            (None, Some(_)) => None,
            (None, None) => Some(provide_default_http_client()?),
        };

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let config = CoreConfig {
            access_token: self.access_token,
            http_client,
            file_system: Some(file_system),
            remote_store: self.remote_store,
            root_folder_id: self
                .root_folder_id
                .unwrap_or_else(|| DEFAULT_ROOT_FOLDER_ID.to_string()),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            list_item_limit: self.list_item_limit,
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
            resolution_mode: self.resolution_mode,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use bridge_traits::storage::FileMetadata;
    use bytes::Bytes;
    use mockall::mock;
    use std::path::{Path, PathBuf};

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    mock! {
        Fs {}

        #[async_trait]
        impl FileSystemAccess for Fs {
            async fn exists(&self, path: &Path) -> BridgeResult<bool>;
            async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata>;
            async fn list_directory(&self, path: &Path) -> BridgeResult<Vec<PathBuf>>;
            async fn is_readable(&self, path: &Path) -> BridgeResult<bool>;
            async fn read_file(&self, path: &Path) -> BridgeResult<Bytes>;
        }
    }

    fn injected() -> CoreConfigBuilder {
        CoreConfig::builder()
            .http_client(Arc::new(MockHttp::new()))
            .file_system(Arc::new(MockFs::new()))
    }

    #[test]
    fn test_builder_defaults() {
        let config = injected().access_token("token").build().unwrap();

        assert_eq!(config.root_folder_id, "root");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.list_item_limit, None);
        assert_eq!(config.resolution_mode, ResolutionMode::FirstMatch);
        assert!(config.remote_store.is_none());
    }

    #[test]
    fn test_builder_requires_access_token() {
        let result = injected().build();

        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Access token")));
    }

    #[test]
    fn test_builder_rejects_blank_access_token() {
        assert!(injected().access_token("   ").build().is_err());
    }

    #[test]
    fn test_validate_page_size_bounds() {
        assert!(injected().access_token("t").page_size(0).build().is_err());
        assert!(injected().access_token("t").page_size(1001).build().is_err());
        assert!(injected().access_token("t").page_size(1000).build().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_item_limit() {
        assert!(injected().access_token("t").list_item_limit(0).build().is_err());
        assert!(injected().access_token("t").list_item_limit(50).build().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_root() {
        assert!(injected().access_token("t").root_folder_id("").build().is_err());
    }

    #[test]
    fn test_builder_with_custom_settings() {
        let config = injected()
            .access_token("t")
            .root_folder_id("0AShared")
            .max_depth(3)
            .resolution_mode(ResolutionMode::Strict)
            .build()
            .unwrap();

        assert_eq!(config.root_folder_id, "0AShared");
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.resolution_mode, ResolutionMode::Strict);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = injected().access_token("ya29.secret").build().unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("ya29.secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_without_shims() {
        let result = CoreConfig::builder()
            .access_token("t")
            .file_system(Arc::new(MockFs::new()))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { capability, .. }) if capability == "HttpClient"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let config = CoreConfig::builder().access_token("t").build().unwrap();

        assert!(config.http_client.is_some());
        assert!(config.file_system.is_some());
    }
}
