//! # Tree Synchronization
//!
//! One-way mirror of a local file or directory tree onto a remote folder.
//!
//! ## Workflow
//!
//! 1. Stop when the recursion depth exceeds `max_depth` (not an error)
//! 2. Provision the destination folder
//! 3. For a single file, sync it into the destination and return
//! 4. For a directory, list the remote folder once, then walk local entries
//!    in name order: recurse into subdirectories, sync files that pass the
//!    optional name pattern
//!
//! A file is uploaded when absent remotely, replaced (delete, then upload)
//! when the sizes differ or the local copy was modified strictly later, and
//! left alone otherwise. Remote deletions are never propagated locally and
//! local deletions are never propagated remotely.
//!
//! Any error aborts the whole run. Work already done is kept.

use bridge_traits::remote::{ChildQuery, KindFilter, ObjectField, RemoteObject, RemoteStore};
use bridge_traits::storage::{FileMetadata, FileSystemAccess, LocalEntryKind};
use core_runtime::config::{ResolutionMode, DEFAULT_MAX_DEPTH};
use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{Result, SyncError};
use crate::listing::{collect_children, find_child, select_candidate, Listing};
use crate::path::{strip_trailing_separator, PathSpec};
use crate::provisioner::FolderProvisioner;

/// Content type sent with every synced upload
pub const UPLOAD_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Only files whose full local path matches at its start are synced
    pub name_pattern: Option<Regex>,
    /// The top-level call runs at depth 1
    pub max_depth: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            name_pattern: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SyncOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_name_pattern(mut self, pattern: &str) -> Result<Self> {
        self.name_pattern = Some(Regex::new(pattern)?);
        Ok(self)
    }

    fn accepts(&self, path: &Path) -> bool {
        match &self.name_pattern {
            None => true,
            Some(pattern) => pattern
                .find(&path.to_string_lossy())
                .is_some_and(|m| m.start() == 0),
        }
    }
}

/// What to do with one local file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    Create,
    Replace,
    Skip,
}

/// Compare a local file against its remote counterpart.
///
/// Both timestamps are UTC. A remote object without a size is treated as
/// stale.
pub fn decide(local: &FileMetadata, remote: Option<&RemoteObject>) -> SyncDecision {
    let Some(remote) = remote else {
        return SyncDecision::Create;
    };

    let size_differs = remote.size != Some(local.size);
    let locally_newer = matches!(
        (local.modified_at, remote.modified_time),
        (Some(local_time), Some(remote_time)) if local_time > remote_time
    );

    if size_differs || locally_newer {
        SyncDecision::Replace
    } else {
        SyncDecision::Skip
    }
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub uploaded: usize,
    pub replaced: usize,
    pub unchanged: usize,
    /// Files rejected by the name pattern
    pub filtered: usize,
    /// Directories not entered because of the depth guard
    pub depth_limited: usize,
}

impl SyncReport {
    pub fn transferred(&self) -> usize {
        self.uploaded + self.replaced
    }
}

enum Destination<'a> {
    /// Raw path from the root
    Path(&'a str),
    /// Folder `name` directly under `parent_id`
    Child { parent_id: String, name: String },
}

pub struct TreeSynchronizer {
    store: Arc<dyn RemoteStore>,
    file_system: Arc<dyn FileSystemAccess>,
    provisioner: Arc<FolderProvisioner>,
    mode: ResolutionMode,
    page_size: u32,
    list_item_limit: Option<usize>,
}

impl TreeSynchronizer {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        file_system: Arc<dyn FileSystemAccess>,
        provisioner: Arc<FolderProvisioner>,
    ) -> Self {
        Self {
            store,
            file_system,
            provisioner,
            mode: ResolutionMode::default(),
            page_size: ChildQuery::DEFAULT_PAGE_SIZE,
            list_item_limit: None,
        }
    }

    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_list_item_limit(mut self, limit: Option<usize>) -> Self {
        self.list_item_limit = limit;
        self
    }

    /// Mirror `local_root` into the folder at `remote_dest`.
    ///
    /// An empty destination means the root folder.
    #[instrument(skip(self, local_root, options), fields(local = %local_root.display()))]
    pub async fn sync(
        &self,
        local_root: &Path,
        remote_dest: &str,
        options: &SyncOptions,
    ) -> Result<SyncReport> {
        let remote_dest = strip_trailing_separator(remote_dest);
        let mut report = SyncReport::default();

        self.sync_at(local_root, Destination::Path(remote_dest), 1, options, &mut report)
            .await?;

        info!(
            uploaded = report.uploaded,
            replaced = report.replaced,
            unchanged = report.unchanged,
            filtered = report.filtered,
            depth_limited = report.depth_limited,
            "Sync finished"
        );
        Ok(report)
    }

    fn sync_at<'a>(
        &'a self,
        local: &'a Path,
        destination: Destination<'a>,
        depth: usize,
        options: &'a SyncOptions,
        report: &'a mut SyncReport,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            if depth > options.max_depth {
                debug!(path = %local.display(), depth, "Depth limit reached");
                report.depth_limited += 1;
                return Ok(());
            }

            let metadata = self.local_metadata(local).await?;
            if !(metadata.is_file() || metadata.is_directory()) {
                return Err(SyncError::UnsupportedLocalEntry(local.to_path_buf()));
            }

            let folder_id = self.provision(destination).await?;

            if metadata.is_file() {
                self.sync_file(local, &metadata, &folder_id, None, report)
                    .await
            } else {
                self.sync_directory(local, &folder_id, depth, options, report)
                    .await
            }
        }
        .boxed()
    }

    async fn provision(&self, destination: Destination<'_>) -> Result<String> {
        match destination {
            Destination::Path(raw) => {
                let spec = PathSpec::parse(raw)?;
                if spec.is_empty() {
                    return Ok(self.provisioner.root_id().to_string());
                }
                self.provisioner
                    .ensure_segments(self.provisioner.root_id(), &spec)
                    .await
            }
            Destination::Child { parent_id, name } => {
                self.provisioner
                    .ensure_segments(&parent_id, &PathSpec::from_segments([name]))
                    .await
            }
        }
    }

    async fn sync_directory(
        &self,
        local_dir: &Path,
        folder_id: &str,
        depth: usize,
        options: &SyncOptions,
        report: &mut SyncReport,
    ) -> Result<()> {
        let query = ChildQuery::children_of(folder_id)
            .kind(KindFilter::NotFolder)
            .fields(ObjectField::SEARCH)
            .page_size(self.page_size);
        let listing = collect_children(self.store.as_ref(), &query, self.list_item_limit).await?;

        let mut entries = self
            .file_system
            .list_directory(local_dir)
            .await
            .map_err(|source| SyncError::LocalAccess {
                path: local_dir.to_path_buf(),
                source,
            })?;
        entries.sort();

        for entry in entries {
            let metadata = self.local_metadata(&entry).await?;
            match metadata.kind {
                LocalEntryKind::Directory => {
                    let destination = Destination::Child {
                        parent_id: folder_id.to_string(),
                        name: entry_name(&entry)?,
                    };
                    self.sync_at(&entry, destination, depth + 1, options, report)
                        .await?;
                }
                LocalEntryKind::File if !options.accepts(&entry) => {
                    debug!(path = %entry.display(), "Filtered by name pattern");
                    report.filtered += 1;
                }
                LocalEntryKind::File => {
                    self.sync_file(&entry, &metadata, folder_id, Some(&listing), report)
                        .await?;
                }
                LocalEntryKind::Other => {
                    return Err(SyncError::UnsupportedLocalEntry(entry));
                }
            }
        }

        Ok(())
    }

    async fn sync_file(
        &self,
        local: &Path,
        metadata: &FileMetadata,
        folder_id: &str,
        listing: Option<&Listing>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let name = entry_name(local)?;
        let existing = match listing {
            Some(listing) if !listing.truncated => select_candidate(
                listing.named(&name).cloned().collect(),
                self.mode,
                folder_id,
                &name,
            )?,
            _ => {
                let query = ChildQuery::children_of(folder_id)
                    .named(name.as_str())
                    .kind(KindFilter::NotFolder)
                    .fields(ObjectField::SEARCH)
                    .page_size(self.page_size);
                find_child(self.store.as_ref(), &query, self.mode).await?
            }
        };

        match (decide(metadata, existing.as_ref()), existing) {
            (SyncDecision::Skip, _) => {
                debug!(name = %name, "Remote copy is current");
                report.unchanged += 1;
            }
            (SyncDecision::Replace, Some(stale)) => {
                self.ensure_readable(local).await?;
                self.store.delete_object(&stale.id).await?;
                self.upload(local, &name, folder_id).await?;
                info!(name = %name, old_id = %stale.id, "Replaced stale remote copy");
                report.replaced += 1;
            }
            (SyncDecision::Create, _) | (SyncDecision::Replace, None) => {
                self.ensure_readable(local).await?;
                self.upload(local, &name, folder_id).await?;
                report.uploaded += 1;
            }
        }

        Ok(())
    }

    async fn upload(&self, local: &Path, name: &str, folder_id: &str) -> Result<String> {
        let id = self
            .store
            .upload_content(local, name, UPLOAD_MIME_TYPE, Some(folder_id.to_string()))
            .await?;
        info!(name = %name, id = %id, folder_id, "Uploaded file");
        Ok(id)
    }

    async fn ensure_readable(&self, local: &Path) -> Result<()> {
        let readable = self
            .file_system
            .is_readable(local)
            .await
            .map_err(|source| SyncError::LocalAccess {
                path: local.to_path_buf(),
                source,
            })?;
        if readable {
            Ok(())
        } else {
            Err(SyncError::LocalFileUnreadable(local.to_path_buf()))
        }
    }

    async fn local_metadata(&self, path: &Path) -> Result<FileMetadata> {
        let local_error = |source| SyncError::LocalAccess {
            path: path.to_path_buf(),
            source,
        };

        if !self.file_system.exists(path).await.map_err(local_error)? {
            return Err(SyncError::LocalPathNotFound(path.to_path_buf()));
        }
        self.file_system.metadata(path).await.map_err(local_error)
    }
}

fn entry_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| SyncError::UnsupportedLocalEntry(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::remote::ObjectKind;
    use chrono::{DateTime, Duration, Utc};

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn local(size: u64, modified_at: DateTime<Utc>) -> FileMetadata {
        FileMetadata {
            kind: LocalEntryKind::File,
            size,
            modified_at: Some(modified_at),
        }
    }

    fn remote(size: Option<u64>, modified_time: DateTime<Utc>) -> RemoteObject {
        let mut object = RemoteObject::new("r1", "report.txt", ObjectKind::File);
        object.size = size;
        object.modified_time = Some(modified_time);
        object
    }

    #[test]
    fn test_absent_remote_is_created() {
        assert_eq!(decide(&local(120, t0()), None), SyncDecision::Create);
    }

    #[test]
    fn test_same_size_newer_local_is_replaced() {
        let later = t0() + Duration::seconds(1);
        assert_eq!(
            decide(&local(120, later), Some(&remote(Some(120), t0()))),
            SyncDecision::Replace
        );
    }

    #[test]
    fn test_same_size_not_newer_is_skipped() {
        assert_eq!(
            decide(&local(120, t0()), Some(&remote(Some(120), t0()))),
            SyncDecision::Skip
        );
        assert_eq!(
            decide(
                &local(120, t0() - Duration::hours(2)),
                Some(&remote(Some(120), t0()))
            ),
            SyncDecision::Skip
        );
    }

    #[test]
    fn test_size_change_wins_over_older_mtime() {
        assert_eq!(
            decide(
                &local(140, t0() - Duration::days(1)),
                Some(&remote(Some(120), t0()))
            ),
            SyncDecision::Replace
        );
    }

    #[test]
    fn test_unknown_remote_size_is_stale() {
        assert_eq!(
            decide(&local(120, t0()), Some(&remote(None, t0()))),
            SyncDecision::Replace
        );
    }

    #[test]
    fn test_pattern_anchored_at_path_start() {
        let options = SyncOptions::default()
            .with_name_pattern(r"/data/.*\.csv")
            .unwrap();

        assert!(options.accepts(Path::new("/data/2024/report.csv")));
        assert!(!options.accepts(Path::new("/backup/data/report.csv")));
        assert!(SyncOptions::default().accepts(Path::new("/anything")));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            SyncOptions::default().with_name_pattern("(unclosed"),
            Err(SyncError::InvalidPattern(_))
        ));
    }
}
