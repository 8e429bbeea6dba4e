//! Remote hierarchical object store abstraction
//!
//! The store addresses objects by opaque identifier. Names are not unique
//! under a parent and an object may have several parents, so nothing here
//! assumes a tree: callers only ever ask "children of X named Y".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::error::Result;

/// Coarse classification of a remote object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Folder,
    File,
    /// Store-native typed objects (documents, shortcuts, ...)
    Other,
}

/// Attribute that can be projected in listings and metadata fetches.
///
/// `Id`, `Name` and `MimeType` are always returned; requesting them is
/// harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectField {
    Id,
    Name,
    MimeType,
    Size,
    ModifiedTime,
    Parents,
    Md5Checksum,
}

impl ObjectField {
    /// The attribute set used by file-sync comparisons and `search_file`
    pub const SEARCH: &'static [ObjectField] = &[
        ObjectField::Id,
        ObjectField::Name,
        ObjectField::Size,
        ObjectField::MimeType,
        ObjectField::ModifiedTime,
        ObjectField::Parents,
        ObjectField::Md5Checksum,
    ];
}

/// A projected view of a remote object. Attributes that were not requested
/// are `None` / empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteObject {
    pub id: String,
    pub name: String,
    pub kind: ObjectKind,
    pub mime_type: Option<String>,
    pub size: Option<u64>,
    pub modified_time: Option<DateTime<Utc>>,
    pub parents: Vec<String>,
    pub md5_checksum: Option<String>,
}

impl RemoteObject {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            mime_type: None,
            size: None,
            modified_time: None,
            parents: Vec::new(),
            md5_checksum: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ObjectKind::Folder
    }
}

/// Restricts a child listing by object type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindFilter {
    Folder,
    NotFolder,
    MimeType(String),
}

/// A scoped listing request: children of `parent_id`, optionally filtered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildQuery {
    pub parent_id: String,
    pub name: Option<String>,
    pub kind: Option<KindFilter>,
    pub fields: Vec<ObjectField>,
    pub page_size: u32,
}

impl ChildQuery {
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    pub fn children_of(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            name: None,
            kind: None,
            fields: vec![ObjectField::Id, ObjectField::Name, ObjectField::MimeType],
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn kind(mut self, kind: KindFilter) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn fields(mut self, fields: &[ObjectField]) -> Self {
        self.fields = fields.to_vec();
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<RemoteObject>,
    pub next_page_token: Option<String>,
}

/// Remote store client
///
/// Thin primitives only. Path semantics, pagination loops and sync policy
/// live in `core-sync`; retry and backoff, if any, live in the
/// implementation.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch one page of children matching `query`
    async fn list_children(
        &self,
        query: &ChildQuery,
        page_token: Option<String>,
    ) -> Result<ObjectPage>;

    /// Fetch the projected metadata of a single object
    async fn get_object(&self, id: &str, fields: &[ObjectField]) -> Result<RemoteObject>;

    /// Create an empty object. When `parent_id` is `None` the store places it
    /// at its default location.
    async fn create_object(
        &self,
        name: &str,
        kind: ObjectKind,
        parent_id: Option<String>,
    ) -> Result<String>;

    /// Whether `create_object` honors `parent_id` atomically. Stores that
    /// return `false` get a create-then-reparent sequence instead.
    fn supports_create_with_parent(&self) -> bool;

    async fn update_parents(
        &self,
        id: &str,
        add_parent: &str,
        remove_parents: &[String],
    ) -> Result<()>;

    async fn rename_object(&self, id: &str, new_name: &str) -> Result<()>;

    async fn delete_object(&self, id: &str) -> Result<()>;

    /// Upload a local file as a new object
    async fn upload_content(
        &self,
        local_path: &Path,
        name: &str,
        mime_type: &str,
        parent_id: Option<String>,
    ) -> Result<String>;

    /// Copy an object; the copy keeps the source's parents
    async fn copy_object(&self, id: &str) -> Result<String>;
}
