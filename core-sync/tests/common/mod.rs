//! In-memory collaborators for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::remote::{
    ChildQuery, KindFilter, ObjectField, ObjectKind, ObjectPage, RemoteObject, RemoteStore,
};
use bridge_traits::storage::{FileMetadata, FileSystemAccess, LocalEntryKind};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

/// Every call the store receives, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List {
        parent_id: String,
        name: Option<String>,
    },
    Get(String),
    Create {
        name: String,
        parent_id: Option<String>,
    },
    UpdateParents {
        id: String,
        add: String,
    },
    Rename {
        id: String,
        name: String,
    },
    Delete(String),
    Upload {
        name: String,
        parent_id: Option<String>,
    },
    Copy(String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Call::List { .. } | Call::Get(_))
    }
}

struct StoreState {
    /// Insertion order doubles as listing order
    objects: Vec<RemoteObject>,
    calls: Vec<Call>,
    next_id: usize,
    now: DateTime<Utc>,
}

/// Remote store backed by a vector of objects.
///
/// Uploads take their size from the attached file system and their
/// modification time from the store clock. Every call yields once so
/// concurrent callers interleave.
pub struct MemoryStore {
    state: Mutex<StoreState>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    create_with_parent: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                objects: Vec::new(),
                calls: Vec::new(),
                next_id: 1,
                now: at("2024-03-01T12:00:00Z"),
            }),
            file_system: None,
            create_with_parent: true,
        }
    }

    pub fn with_file_system(mut self, file_system: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(file_system);
        self
    }

    /// Emulate a store whose creates always land at the top level
    pub fn without_create_with_parent(mut self) -> Self {
        self.create_with_parent = false;
        self
    }

    pub fn set_now(&self, now: DateTime<Utc>) {
        self.state.lock().unwrap().now = now;
    }

    pub fn insert(&self, name: &str, kind: ObjectKind, parent_id: &str) -> String {
        self.insert_object(name, kind, Some(parent_id), None)
    }

    pub fn insert_file(&self, name: &str, parent_id: &str, size: u64, modified: DateTime<Utc>) -> String {
        let id = self.insert_object(name, ObjectKind::File, Some(parent_id), Some(size));
        let mut state = self.state.lock().unwrap();
        if let Some(object) = state.objects.iter_mut().find(|o| o.id == id) {
            object.modified_time = Some(modified);
        }
        id
    }

    fn insert_object(&self, name: &str, kind: ObjectKind, parent_id: Option<&str>, size: Option<u64>) -> String {
        let mut state = self.state.lock().unwrap();
        let id = format!("id{}", state.next_id);
        state.next_id += 1;

        let mut object = RemoteObject::new(id.clone(), name, kind);
        object.mime_type = Some(match kind {
            ObjectKind::Folder => FOLDER_MIME.to_string(),
            _ => "application/octet-stream".to_string(),
        });
        object.parents = vec![parent_id.unwrap_or("root").to_string()];
        object.size = size;
        object.modified_time = Some(state.now);
        state.objects.push(object);
        id
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn object(&self, id: &str) -> Option<RemoteObject> {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .find(|o| o.id == id)
            .cloned()
    }

    pub fn children(&self, parent_id: &str) -> Vec<RemoteObject> {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .filter(|o| o.parents.iter().any(|p| p == parent_id))
            .cloned()
            .collect()
    }

    pub fn children_named(&self, parent_id: &str, name: &str) -> Vec<RemoteObject> {
        self.children(parent_id)
            .into_iter()
            .filter(|o| o.name == name)
            .collect()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn matches(object: &RemoteObject, query: &ChildQuery) -> bool {
        let kind_ok = match &query.kind {
            None => true,
            Some(KindFilter::Folder) => object.kind == ObjectKind::Folder,
            Some(KindFilter::NotFolder) => object.kind != ObjectKind::Folder,
            Some(KindFilter::MimeType(mime)) => object.mime_type.as_deref() == Some(mime.as_str()),
        };
        kind_ok
            && object.parents.iter().any(|p| *p == query.parent_id)
            && query.name.as_ref().map_or(true, |name| *name == object.name)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_children(&self, query: &ChildQuery, page_token: Option<String>) -> Result<ObjectPage> {
        self.record(Call::List {
            parent_id: query.parent_id.clone(),
            name: query.name.clone(),
        });
        tokio::task::yield_now().await;

        let state = self.state.lock().unwrap();
        let matching: Vec<RemoteObject> = state
            .objects
            .iter()
            .filter(|o| Self::matches(o, query))
            .cloned()
            .collect();

        let offset: usize = page_token.map_or(0, |t| t.parse().unwrap());
        let end = (offset + query.page_size as usize).min(matching.len());
        Ok(ObjectPage {
            objects: matching[offset..end].to_vec(),
            next_page_token: (end < matching.len()).then(|| end.to_string()),
        })
    }

    async fn get_object(&self, id: &str, _fields: &[ObjectField]) -> Result<RemoteObject> {
        self.record(Call::Get(id.to_string()));
        self.object(id)
            .ok_or_else(|| BridgeError::NotFound(id.to_string()))
    }

    async fn create_object(&self, name: &str, kind: ObjectKind, parent_id: Option<String>) -> Result<String> {
        self.record(Call::Create {
            name: name.to_string(),
            parent_id: parent_id.clone(),
        });
        tokio::task::yield_now().await;

        let parent = if self.create_with_parent { parent_id.as_deref() } else { None };
        Ok(self.insert_object(name, kind, parent, None))
    }

    fn supports_create_with_parent(&self) -> bool {
        self.create_with_parent
    }

    async fn update_parents(&self, id: &str, add_parent: &str, remove_parents: &[String]) -> Result<()> {
        self.record(Call::UpdateParents {
            id: id.to_string(),
            add: add_parent.to_string(),
        });

        let mut state = self.state.lock().unwrap();
        let object = state
            .objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| BridgeError::NotFound(id.to_string()))?;
        object.parents.retain(|p| !remove_parents.contains(p));
        object.parents.push(add_parent.to_string());
        Ok(())
    }

    async fn rename_object(&self, id: &str, new_name: &str) -> Result<()> {
        self.record(Call::Rename {
            id: id.to_string(),
            name: new_name.to_string(),
        });

        let mut state = self.state.lock().unwrap();
        let object = state
            .objects
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| BridgeError::NotFound(id.to_string()))?;
        object.name = new_name.to_string();
        Ok(())
    }

    async fn delete_object(&self, id: &str) -> Result<()> {
        self.record(Call::Delete(id.to_string()));

        let mut state = self.state.lock().unwrap();
        let before = state.objects.len();
        state.objects.retain(|o| o.id != id);
        if state.objects.len() == before {
            return Err(BridgeError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn upload_content(
        &self,
        local_path: &Path,
        name: &str,
        _mime_type: &str,
        parent_id: Option<String>,
    ) -> Result<String> {
        self.record(Call::Upload {
            name: name.to_string(),
            parent_id: parent_id.clone(),
        });

        let size = match &self.file_system {
            Some(fs) => Some(fs.metadata(local_path).await?.size),
            None => None,
        };
        Ok(self.insert_object(name, ObjectKind::File, parent_id.as_deref(), size))
    }

    async fn copy_object(&self, id: &str) -> Result<String> {
        self.record(Call::Copy(id.to_string()));

        let original = self
            .object(id)
            .ok_or_else(|| BridgeError::NotFound(id.to_string()))?;
        let copy_id = self.insert_object(
            &format!("Copy of {}", original.name),
            original.kind,
            original.parents.first().map(String::as_str),
            original.size,
        );
        Ok(copy_id)
    }
}

#[derive(Debug, Clone)]
struct LocalEntry {
    kind: LocalEntryKind,
    size: u64,
    modified_at: DateTime<Utc>,
    readable: bool,
}

/// Local tree held in a sorted map of absolute paths
#[derive(Default)]
pub struct MemoryFileSystem {
    entries: Mutex<BTreeMap<PathBuf, LocalEntry>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock().unwrap();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() || ancestor == Path::new("/") {
                continue;
            }
            entries.entry(ancestor.to_path_buf()).or_insert(LocalEntry {
                kind: LocalEntryKind::Directory,
                size: 0,
                modified_at: at("2024-01-01T00:00:00Z"),
                readable: true,
            });
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, size: u64, modified_at: DateTime<Utc>) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.entries.lock().unwrap().insert(
            path.to_path_buf(),
            LocalEntry {
                kind: LocalEntryKind::File,
                size,
                modified_at,
                readable: true,
            },
        );
    }

    pub fn add_special(&self, path: impl AsRef<Path>) {
        self.entries.lock().unwrap().insert(
            path.as_ref().to_path_buf(),
            LocalEntry {
                kind: LocalEntryKind::Other,
                size: 0,
                modified_at: at("2024-01-01T00:00:00Z"),
                readable: false,
            },
        );
    }

    pub fn set_unreadable(&self, path: impl AsRef<Path>) {
        if let Some(entry) = self.entries.lock().unwrap().get_mut(path.as_ref()) {
            entry.readable = false;
        }
    }

    fn entry(&self, path: &Path) -> Result<LocalEntry> {
        self.entries
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(path.display().to_string()))
    }
}

#[async_trait]
impl FileSystemAccess for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self.entries.lock().unwrap().contains_key(path))
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let entry = self.entry(path)?;
        Ok(FileMetadata {
            kind: entry.kind,
            size: entry.size,
            modified_at: Some(entry.modified_at),
        })
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .keys()
            .filter(|candidate| candidate.parent() == Some(path))
            .cloned()
            .collect())
    }

    async fn is_readable(&self, path: &Path) -> Result<bool> {
        Ok(self.entry(path)?.readable)
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes> {
        let entry = self.entry(path)?;
        Ok(Bytes::from(vec![0u8; entry.size as usize]))
    }
}

pub fn folder_count(store: &MemoryStore, parent_id: &str, name: &str) -> usize {
    store
        .children_named(parent_id, name)
        .iter()
        .filter(|o| o.kind == ObjectKind::Folder)
        .count()
}
