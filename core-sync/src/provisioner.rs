//! # Folder Provisioning
//!
//! Ensures every segment of a folder path exists, creating the missing ones,
//! and returns the identifier of the deepest folder.
//!
//! Lookups match folders only, so a file that shares a segment's name is
//! never adopted as a parent; a folder of the same name is created beside it.
//!
//! The store does not enforce unique names, so two callers racing to create
//! the same folder would both succeed. Each look-up-or-create step therefore
//! runs under an advisory lock keyed by `(parent_id, name)`.

use bridge_traits::remote::{ChildQuery, KindFilter, ObjectField, ObjectKind, RemoteStore};
use core_runtime::config::ResolutionMode;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{Result, SyncError};
use crate::listing::find_child;
use crate::locks::KeyedLocks;
use crate::path::PathSpec;

pub struct FolderProvisioner {
    store: Arc<dyn RemoteStore>,
    root_id: String,
    page_size: u32,
    mode: ResolutionMode,
    locks: KeyedLocks,
}

impl FolderProvisioner {
    pub fn new(store: Arc<dyn RemoteStore>, root_id: impl Into<String>) -> Self {
        Self {
            store,
            root_id: root_id.into(),
            page_size: ChildQuery::DEFAULT_PAGE_SIZE,
            mode: ResolutionMode::default(),
            locks: KeyedLocks::new(),
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

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Ensure `path` exists under the root
    pub async fn ensure_folder_path(&self, path: &str) -> Result<String> {
        self.ensure_folder_path_from(&self.root_id, path).await
    }

    /// Ensure `path` exists under `parent_id`.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NoParent`] when `parent_id` is empty
    /// - [`SyncError::EmptyPath`] when `path` is empty or has an empty segment
    pub async fn ensure_folder_path_from(&self, parent_id: &str, path: &str) -> Result<String> {
        if parent_id.is_empty() {
            return Err(SyncError::NoParent);
        }

        let spec = PathSpec::parse(path)?;
        if spec.is_empty() || spec.has_empty_segment() {
            return Err(SyncError::EmptyPath(path.to_string()));
        }

        self.ensure_segments(parent_id, &spec).await
    }

    /// Walk `spec` below `parent_id` one segment at a time, adopting
    /// existing folders and creating missing ones.
    #[instrument(skip(self, spec), fields(path = %spec))]
    pub async fn ensure_segments(&self, parent_id: &str, spec: &PathSpec) -> Result<String> {
        if parent_id.is_empty() {
            return Err(SyncError::NoParent);
        }

        let mut current = parent_id.to_string();
        for segment in spec.segments() {
            if segment.is_empty() {
                return Err(SyncError::EmptyPath(spec.to_string()));
            }
            current = self.ensure_child_folder(&current, segment).await?;
        }

        Ok(current)
    }

    /// Look up folder `name` under `parent_id`, creating it when absent
    async fn ensure_child_folder(&self, parent_id: &str, name: &str) -> Result<String> {
        let _guard = self.locks.acquire(parent_id, name).await;

        let query = ChildQuery::children_of(parent_id)
            .named(name)
            .kind(KindFilter::Folder)
            .page_size(self.page_size);

        if let Some(existing) = find_child(self.store.as_ref(), &query, self.mode).await? {
            debug!(parent_id, name, id = %existing.id, "Folder exists");
            return Ok(existing.id);
        }

        let id = self.create_folder(parent_id, name).await?;
        info!(parent_id, name, id = %id, "Created folder");
        Ok(id)
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> Result<String> {
        if self.store.supports_create_with_parent() {
            return Ok(self
                .store
                .create_object(name, ObjectKind::Folder, Some(parent_id.to_string()))
                .await?);
        }

        // New objects land at the top level; move into place.
        let id = self
            .store
            .create_object(name, ObjectKind::Folder, None)
            .await?;
        let created = self.store.get_object(&id, &[ObjectField::Parents]).await?;
        self.store
            .update_parents(&id, parent_id, &created.parents)
            .await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{folder, page, MockStore};
    use bridge_traits::remote::RemoteObject;
    use mockall::Sequence;

    #[tokio::test]
    async fn test_adopts_existing_folders() {
        let mut store = MockStore::new();
        let mut seq = Sequence::new();
        store
            .expect_list_children()
            .withf(|q, _| q.parent_id == "root" && q.kind == Some(KindFilter::Folder))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| page(vec![folder("id-x", "x")], None));
        store
            .expect_list_children()
            .withf(|q, _| q.parent_id == "id-x" && q.name.as_deref() == Some("y"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| page(vec![folder("id-y", "y")], None));
        store.expect_create_object().never();

        let provisioner = FolderProvisioner::new(Arc::new(store), "root");

        assert_eq!(provisioner.ensure_folder_path("x/y").await.unwrap(), "id-y");
    }

    #[tokio::test]
    async fn test_creates_missing_with_parent() {
        let mut store = MockStore::new();
        store
            .expect_list_children()
            .times(2)
            .returning(|q, _| {
                if q.parent_id == "root" {
                    page(vec![folder("id-x", "x")], None)
                } else {
                    page(vec![], None)
                }
            });
        store.expect_supports_create_with_parent().return_const(true);
        store
            .expect_create_object()
            .withf(|name, kind, parent| {
                name == "y" && *kind == ObjectKind::Folder && parent.as_deref() == Some("id-x")
            })
            .times(1)
            .returning(|_, _, _| Ok("id-y".to_string()));

        let provisioner = FolderProvisioner::new(Arc::new(store), "root");

        assert_eq!(provisioner.ensure_folder_path("/x/y").await.unwrap(), "id-y");
    }

    #[tokio::test]
    async fn test_create_then_reparent_when_store_requires_it() {
        let mut store = MockStore::new();
        let mut seq = Sequence::new();
        store
            .expect_list_children()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| page(vec![], None));
        store.expect_supports_create_with_parent().return_const(false);
        store
            .expect_create_object()
            .withf(|name, _, parent| name == "z" && parent.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok("id-z".to_string()));
        store
            .expect_get_object()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id, _| {
                let mut object = RemoteObject::new(id, "z", ObjectKind::Folder);
                object.parents = vec!["top".to_string()];
                Ok(object)
            });
        store
            .expect_update_parents()
            .withf(|id, add, remove| {
                id == "id-z" && add == "parent" && remove.len() == 1 && remove[0] == "top"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let provisioner = FolderProvisioner::new(Arc::new(store), "root");
        let id = provisioner.ensure_folder_path_from("parent", "z").await.unwrap();

        assert_eq!(id, "id-z");
    }

    #[tokio::test]
    async fn test_empty_parent_is_no_parent() {
        let provisioner = FolderProvisioner::new(Arc::new(MockStore::new()), "root");

        assert!(matches!(
            provisioner.ensure_folder_path_from("", "x").await,
            Err(SyncError::NoParent)
        ));
    }

    #[tokio::test]
    async fn test_empty_segments_are_rejected_before_any_call() {
        let provisioner = FolderProvisioner::new(Arc::new(MockStore::new()), "root");

        for path in ["", "/", "x//y", "x/y/"] {
            assert!(
                matches!(
                    provisioner.ensure_folder_path(path).await,
                    Err(SyncError::EmptyPath(_))
                ),
                "path {:?}",
                path
            );
        }
    }

    #[tokio::test]
    async fn test_adopts_folder_behind_empty_first_page() {
        let mut store = MockStore::new();
        let mut seq = Sequence::new();
        store
            .expect_list_children()
            .withf(|q, token| q.name.as_deref() == Some("docs") && token.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| page(vec![], Some("p2")));
        store
            .expect_list_children()
            .withf(|_, token| token.as_deref() == Some("p2"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| page(vec![folder("id-docs", "docs")], None));
        store.expect_create_object().never();

        let provisioner = FolderProvisioner::new(Arc::new(store), "root");

        assert_eq!(provisioner.ensure_folder_path("docs").await.unwrap(), "id-docs");
    }
}
