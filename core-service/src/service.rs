//! # Drive Service
//!
//! Path-oriented file management over the resolver, provisioner and
//! synchronizer. Nothing is cached: every operation resolves its paths from
//! the root again, so concurrent external changes are always observed.

use bridge_traits::remote::{ChildQuery, KindFilter, ObjectField, RemoteObject, RemoteStore};
use core_runtime::config::{
    CoreConfig, ResolutionMode, DEFAULT_MAX_DEPTH, DEFAULT_PAGE_SIZE, DEFAULT_ROOT_FOLDER_ID,
};
use core_sync::path::strip_trailing_separator;
use core_sync::synchronizer::UPLOAD_MIME_TYPE;
use core_sync::{
    collect_children, ConfirmationPolicy, Decision, FolderProvisioner, PathResolver, PathSpec,
    SyncError, SyncOptions, SyncReport, TreeSynchronizer, Walk,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{CoreError, Result};
use crate::CoreDependencies;

/// Attributes fetched when only an object's kind matters
const KIND_FIELDS: &[ObjectField] = &[ObjectField::Id, ObjectField::Name, ObjectField::MimeType];

/// Resolution and sync settings shared by every operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub root_folder_id: String,
    pub page_size: u32,
    pub list_item_limit: Option<usize>,
    pub max_depth: usize,
    pub resolution_mode: ResolutionMode,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            root_folder_id: DEFAULT_ROOT_FOLDER_ID.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            list_item_limit: None,
            max_depth: DEFAULT_MAX_DEPTH,
            resolution_mode: ResolutionMode::default(),
        }
    }
}

impl From<&CoreConfig> for ServiceSettings {
    fn from(config: &CoreConfig) -> Self {
        Self {
            root_folder_id: config.root_folder_id.clone(),
            page_size: config.page_size,
            list_item_limit: config.list_item_limit,
            max_depth: config.max_depth,
            resolution_mode: config.resolution_mode,
        }
    }
}

/// A destination path split into an existing folder and an optional new name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestPath {
    pub folder_id: String,
    /// Last segment, when it does not name an existing folder
    pub file_name: Option<String>,
}

/// Primary façade exposed to host applications.
pub struct DriveService {
    deps: Arc<CoreDependencies>,
    settings: ServiceSettings,
    resolver: PathResolver,
    provisioner: Arc<FolderProvisioner>,
    synchronizer: TreeSynchronizer,
}

impl DriveService {
    /// Create a service with default settings.
    pub fn new(deps: CoreDependencies) -> Self {
        Self::with_settings(deps, ServiceSettings::default())
    }

    pub fn with_settings(deps: CoreDependencies, settings: ServiceSettings) -> Self {
        let store = Arc::clone(&deps.remote_store);

        let resolver = PathResolver::new(Arc::clone(&store), settings.root_folder_id.clone())
            .with_mode(settings.resolution_mode)
            .with_page_size(settings.page_size);
        let provisioner = Arc::new(
            FolderProvisioner::new(Arc::clone(&store), settings.root_folder_id.clone())
                .with_mode(settings.resolution_mode)
                .with_page_size(settings.page_size),
        );
        let synchronizer = TreeSynchronizer::new(
            store,
            Arc::clone(&deps.filesystem),
            Arc::clone(&provisioner),
        )
        .with_mode(settings.resolution_mode)
        .with_page_size(settings.page_size)
        .with_list_item_limit(settings.list_item_limit);

        Self {
            deps: Arc::new(deps),
            settings,
            resolver,
            provisioner,
            synchronizer,
        }
    }

    /// Build the bridges described by `config` and wrap them in a service.
    pub fn from_config(config: CoreConfig) -> Result<Self> {
        let deps = CoreDependencies::from_config(&config)?;
        info!(
            root = %config.root_folder_id,
            page_size = config.page_size,
            mode = ?config.resolution_mode,
            "Drive service initialized"
        );
        Ok(Self::with_settings(deps, ServiceSettings::from(&config)))
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    fn store(&self) -> &dyn RemoteStore {
        self.deps.remote_store.as_ref()
    }

    fn root_id(&self) -> &str {
        &self.settings.root_folder_id
    }

    // ------------------------------------------------------------------
    // Resolution and provisioning
    // ------------------------------------------------------------------

    /// Identifier of the object at `path`, or `None` when it does not exist.
    pub async fn resolve(&self, path: &str) -> Result<Option<String>> {
        Ok(self.resolver.resolve_id(path).await?)
    }

    /// Resolve `path` and fetch the attributes used for file comparisons
    /// (id, name, size, mime type, modification time, parents, checksum).
    pub async fn search_file(&self, path: &str) -> Result<Option<RemoteObject>> {
        Ok(self.resolver.resolve(path, ObjectField::SEARCH).await?)
    }

    /// Create the missing folders of `path` and return the deepest one.
    pub async fn ensure_folder_path(&self, path: &str) -> Result<String> {
        Ok(self.provisioner.ensure_folder_path(path).await?)
    }

    /// Split `path` into its deepest existing folder and the remaining name.
    ///
    /// - every segment is an existing folder: `(folder, None)`
    /// - only the last segment is missing (or is not a folder):
    ///   `(parent folder, Some(last segment))`
    /// - an intermediate segment is missing: `None`
    #[instrument(skip(self))]
    pub async fn parse_dest_path(&self, path: &str) -> Result<Option<DestPath>> {
        let spec = PathSpec::parse(strip_trailing_separator(path))?;
        let walk = self
            .resolver
            .walk_from(self.root_id(), &spec, Some(KindFilter::Folder))
            .await?;

        Ok(match walk {
            Walk::Empty => Some(DestPath {
                folder_id: self.root_id().to_string(),
                file_name: None,
            }),
            Walk::Found { id } => Some(DestPath {
                folder_id: id,
                file_name: None,
            }),
            Walk::MissingLeaf { parent_id, name } => Some(DestPath {
                folder_id: parent_id,
                file_name: Some(name),
            }),
            Walk::Missing { segment, .. } => {
                debug!(segment = %segment, "Destination folder missing");
                None
            }
        })
    }

    // ------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------

    /// Default options for [`sync`](Self::sync), carrying the configured
    /// depth bound.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions::default().with_max_depth(self.settings.max_depth)
    }

    pub async fn sync(
        &self,
        local_root: &Path,
        remote_dest: &str,
        options: &SyncOptions,
    ) -> Result<SyncReport> {
        Ok(self
            .synchronizer
            .sync(local_root, remote_dest, options)
            .await?)
    }

    // ------------------------------------------------------------------
    // Listing
    // ------------------------------------------------------------------

    /// Children of the folder at `path`. `""` and `"/"` list the root.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotFound`] when the path does not resolve
    /// - [`SyncError::NotAFolder`] when it names a file
    pub async fn list_directory(&self, path: &str) -> Result<Vec<RemoteObject>> {
        let folder_id = if path.is_empty() || path == "/" {
            self.root_id().to_string()
        } else {
            let object = self
                .resolver
                .resolve(path, KIND_FIELDS)
                .await?
                .ok_or_else(|| SyncError::NotFound(path.to_string()))?;
            if !object.is_folder() {
                return Err(SyncError::NotAFolder(path.to_string()).into());
            }
            object.id
        };

        self.list_directory_by_id(&folder_id).await
    }

    pub async fn list_directory_by_id(&self, folder_id: &str) -> Result<Vec<RemoteObject>> {
        let query = ChildQuery::children_of(folder_id)
            .fields(ObjectField::SEARCH)
            .page_size(self.settings.page_size);
        self.collect(&query).await
    }

    /// Folders under `parent_id` (the root when absent), optionally by name.
    pub async fn list_folders(
        &self,
        name: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<Vec<RemoteObject>> {
        let query = self.scoped_query(name, parent_id).kind(KindFilter::Folder);
        self.collect(&query).await
    }

    /// Files under `parent_id` (the root when absent). Without a mime type
    /// every non-folder object is listed.
    pub async fn list_files(
        &self,
        name: Option<&str>,
        mime_type: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<Vec<RemoteObject>> {
        let kind = match mime_type {
            Some(mime_type) => KindFilter::MimeType(mime_type.to_string()),
            None => KindFilter::NotFolder,
        };
        let query = self.scoped_query(name, parent_id).kind(kind);
        self.collect(&query).await
    }

    fn scoped_query(&self, name: Option<&str>, parent_id: Option<&str>) -> ChildQuery {
        let parent_id = match parent_id {
            None | Some("") | Some("/") => self.root_id(),
            Some(id) => id,
        };

        let query = ChildQuery::children_of(parent_id)
            .fields(ObjectField::SEARCH)
            .page_size(self.settings.page_size);

        match name.map(|name| name.strip_prefix('/').unwrap_or(name)) {
            Some(name) if !name.is_empty() => query.named(name),
            _ => query,
        }
    }

    async fn collect(&self, query: &ChildQuery) -> Result<Vec<RemoteObject>> {
        let listing =
            collect_children(self.store(), query, self.settings.list_item_limit).await?;
        Ok(listing.objects)
    }

    // ------------------------------------------------------------------
    // Deletion
    // ------------------------------------------------------------------

    /// Delete the files [`list_files`](Self::list_files) returns, each one
    /// gated by `policy`. Returns how many were deleted; an `Abort` stops
    /// early and keeps that count.
    #[instrument(skip(self, policy))]
    pub async fn delete_matching(
        &self,
        name: Option<&str>,
        mime_type: Option<&str>,
        parent_id: Option<&str>,
        policy: &dyn ConfirmationPolicy,
    ) -> Result<usize> {
        let candidates = self.list_files(name, mime_type, parent_id).await?;
        self.delete_confirmed(candidates, policy).await
    }

    /// Folder counterpart of [`delete_matching`](Self::delete_matching).
    /// Deleting a folder removes its subtree.
    #[instrument(skip(self, policy))]
    pub async fn delete_folders(
        &self,
        name: Option<&str>,
        parent_id: Option<&str>,
        policy: &dyn ConfirmationPolicy,
    ) -> Result<usize> {
        let candidates = self.list_folders(name, parent_id).await?;
        self.delete_confirmed(candidates, policy).await
    }

    async fn delete_confirmed(
        &self,
        candidates: Vec<RemoteObject>,
        policy: &dyn ConfirmationPolicy,
    ) -> Result<usize> {
        info!(count = candidates.len(), "Deletion candidates found");

        let mut deleted = 0;
        for candidate in candidates {
            match policy.decide(&candidate) {
                Decision::Proceed => {
                    self.store().delete_object(&candidate.id).await?;
                    info!(id = %candidate.id, name = %candidate.name, "Deleted");
                    deleted += 1;
                }
                Decision::Skip => {
                    debug!(id = %candidate.id, name = %candidate.name, "Kept");
                }
                Decision::Abort => {
                    info!(deleted, "Deletion aborted");
                    break;
                }
            }
        }

        Ok(deleted)
    }

    /// Delete the object at `path`; a folder takes its subtree with it.
    ///
    /// With `silent`, a missing path is a no-op and `policy` is never
    /// consulted. Returns whether something was deleted.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotFound`] when the path is missing and not `silent`
    /// - [`SyncError::Aborted`] when the policy aborts
    #[instrument(skip(self, policy))]
    pub async fn remove(
        &self,
        path: &str,
        policy: &dyn ConfirmationPolicy,
        silent: bool,
    ) -> Result<bool> {
        let Some(object) = self.resolver.resolve(path, KIND_FIELDS).await? else {
            if silent {
                debug!("Nothing to remove");
                return Ok(false);
            }
            return Err(SyncError::NotFound(path.to_string()).into());
        };

        let decision = if silent {
            Decision::Proceed
        } else {
            policy.decide(&object)
        };

        match decision {
            Decision::Proceed => {
                self.store().delete_object(&object.id).await?;
                info!(id = %object.id, "Removed");
                Ok(true)
            }
            Decision::Skip => Ok(false),
            Decision::Abort => Err(SyncError::Aborted(path.to_string()).into()),
        }
    }

    // ------------------------------------------------------------------
    // Upload, move, copy, rename
    // ------------------------------------------------------------------

    /// Upload one local file into the root, then move it into `dest` when
    /// that path resolves. An unresolved `dest` leaves the file at the root.
    ///
    /// `name` defaults to the local base name and `mime_type` to
    /// `application/octet-stream`.
    #[instrument(skip(self))]
    pub async fn upload_file(
        &self,
        local: &Path,
        name: Option<&str>,
        mime_type: Option<&str>,
        dest: Option<&str>,
    ) -> Result<String> {
        self.check_uploadable(local).await?;

        let name = match name {
            Some(name) => name.to_string(),
            None => local
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| SyncError::UnsupportedLocalEntry(local.to_path_buf()))?,
        };

        let id = self
            .store()
            .upload_content(
                local,
                &name,
                mime_type.unwrap_or(UPLOAD_MIME_TYPE),
                Some(self.root_id().to_string()),
            )
            .await?;
        info!(id = %id, name = %name, "Uploaded file");

        if let Some(dest) = dest.filter(|dest| !dest.is_empty()) {
            match self.resolve(dest).await? {
                Some(folder_id) => self.move_to_folder_by_id(&id, &folder_id).await?,
                None => warn!(dest, id = %id, "Destination not found, file left at the root"),
            }
        }

        Ok(id)
    }

    async fn check_uploadable(&self, local: &Path) -> Result<()> {
        let fs = &self.deps.filesystem;
        let local_error = |source| SyncError::LocalAccess {
            path: local.to_path_buf(),
            source,
        };

        if !fs.exists(local).await.map_err(local_error)? {
            return Err(SyncError::LocalPathNotFound(local.to_path_buf()).into());
        }
        if !fs.metadata(local).await.map_err(local_error)?.is_file() {
            return Err(SyncError::UnsupportedLocalEntry(local.to_path_buf()).into());
        }
        if !fs.is_readable(local).await.map_err(local_error)? {
            return Err(SyncError::LocalFileUnreadable(local.to_path_buf()).into());
        }
        Ok(())
    }

    /// Move object `id` into `folder_id`, detaching it from its current
    /// parents.
    ///
    /// # Errors
    ///
    /// [`SyncError::NotAFolder`] when `folder_id` is not a folder.
    #[instrument(skip(self))]
    pub async fn move_to_folder_by_id(&self, id: &str, folder_id: &str) -> Result<()> {
        self.ensure_is_folder(folder_id).await?;
        self.reparent(id, folder_id).await
    }

    pub async fn move_to_folder(&self, path: &str, folder_path: &str) -> Result<()> {
        let id = self.require(path).await?;
        let folder_id = self.require(folder_path).await?;
        self.move_to_folder_by_id(&id, &folder_id).await
    }

    /// Copy object `id` into `folder_id` and return the copy's id.
    #[instrument(skip(self))]
    pub async fn copy_to_folder_by_id(&self, id: &str, folder_id: &str) -> Result<String> {
        self.ensure_is_folder(folder_id).await?;

        let copy_id = self.store().copy_object(id).await?;
        self.reparent(&copy_id, folder_id).await?;
        Ok(copy_id)
    }

    pub async fn copy_to_folder(&self, path: &str, folder_path: &str) -> Result<String> {
        let id = self.require(path).await?;
        let folder_id = self.require(folder_path).await?;
        self.copy_to_folder_by_id(&id, &folder_id).await
    }

    /// Rename the object at `path` in place.
    #[instrument(skip(self))]
    pub async fn rename(&self, path: &str, new_name: &str) -> Result<()> {
        let id = self.require(path).await?;
        self.store().rename_object(&id, new_name).await?;
        info!(id = %id, "Renamed");
        Ok(())
    }

    async fn require(&self, path: &str) -> Result<String> {
        self.resolve(path)
            .await?
            .ok_or_else(|| CoreError::from(SyncError::NotFound(path.to_string())))
    }

    async fn ensure_is_folder(&self, folder_id: &str) -> Result<()> {
        let folder = self.store().get_object(folder_id, KIND_FIELDS).await?;
        if folder.is_folder() {
            Ok(())
        } else {
            Err(SyncError::NotAFolder(folder_id.to_string()).into())
        }
    }

    async fn reparent(&self, id: &str, folder_id: &str) -> Result<()> {
        let current = self.store().get_object(id, &[ObjectField::Parents]).await?;
        self.store()
            .update_parents(id, folder_id, &current.parents)
            .await?;
        debug!(id, folder_id, removed = ?current.parents, "Reparented");
        Ok(())
    }
}
