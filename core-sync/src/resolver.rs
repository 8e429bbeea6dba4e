//! # Path Resolution
//!
//! Turns a slash-delimited path into a remote object identifier by walking
//! from the root one segment at a time. Each step is a single scoped
//! lookup, `name = segment` under the identifier produced by the previous
//! step, so a path of N segments costs N lookups, each following page
//! tokens only until a candidate appears.
//!
//! Names are not unique under a parent. In [`ResolutionMode::FirstMatch`]
//! the first object the store returns wins; [`ResolutionMode::Strict`]
//! turns duplicates into [`SyncError::AmbiguousMatch`].
//!
//! Attribute enrichment happens once, after the walk: intermediate segments
//! only ever fetch `id, name, mimeType`.

use bridge_traits::remote::{ChildQuery, KindFilter, ObjectField, RemoteObject, RemoteStore};
use core_runtime::config::ResolutionMode;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::listing::find_child;
use crate::path::PathSpec;

/// Outcome of a segment-by-segment walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Walk {
    /// The path had no segments
    Empty,
    /// Every segment matched
    Found { id: String },
    /// All segments but the last matched
    MissingLeaf { parent_id: String, name: String },
    /// An intermediate segment is missing
    Missing {
        /// Deepest identifier that did resolve
        resolved_id: String,
        segment: String,
        /// Zero-based index of `segment`
        index: usize,
    },
}

impl Walk {
    pub fn found_id(self) -> Option<String> {
        match self {
            Walk::Found { id } => Some(id),
            _ => None,
        }
    }
}

/// Read-only path walker over a [`RemoteStore`]
#[derive(Clone)]
pub struct PathResolver {
    store: Arc<dyn RemoteStore>,
    root_id: String,
    page_size: u32,
    mode: ResolutionMode,
}

impl PathResolver {
    pub fn new(store: Arc<dyn RemoteStore>, root_id: impl Into<String>) -> Self {
        Self {
            store,
            root_id: root_id.into(),
            page_size: ChildQuery::DEFAULT_PAGE_SIZE,
            mode: ResolutionMode::default(),
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

    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    /// Walk `spec` from `start_id`. With `kind` set, every segment must
    /// match that kind (folder-only walks for destinations).
    #[instrument(skip(self, spec), fields(path = %spec))]
    pub async fn walk_from(
        &self,
        start_id: &str,
        spec: &PathSpec,
        kind: Option<KindFilter>,
    ) -> Result<Walk> {
        if spec.is_empty() {
            return Ok(Walk::Empty);
        }

        let last = spec.len() - 1;
        let mut parent_id = start_id.to_string();

        for (index, segment) in spec.segments().iter().enumerate() {
            let mut query = ChildQuery::children_of(parent_id.as_str())
                .named(segment.as_str())
                .page_size(self.page_size);
            if let Some(kind) = &kind {
                query = query.kind(kind.clone());
            }

            match find_child(self.store.as_ref(), &query, self.mode).await? {
                Some(object) => {
                    debug!(segment = %segment, id = %object.id, "Resolved segment");
                    parent_id = object.id;
                }
                None if index == last => {
                    debug!(segment = %segment, parent_id = %parent_id, "Leaf segment missing");
                    return Ok(Walk::MissingLeaf {
                        parent_id,
                        name: segment.clone(),
                    });
                }
                None => {
                    debug!(segment = %segment, index, "Intermediate segment missing");
                    return Ok(Walk::Missing {
                        resolved_id: parent_id,
                        segment: segment.clone(),
                        index,
                    });
                }
            }
        }

        Ok(Walk::Found { id: parent_id })
    }

    /// Walk `spec` from the root
    pub async fn walk(&self, spec: &PathSpec) -> Result<Walk> {
        self.walk_from(&self.root_id, spec, None).await
    }

    /// Identifier at `path`, or `None` when any segment is missing or the
    /// path is empty.
    pub async fn resolve_id(&self, path: &str) -> Result<Option<String>> {
        let spec = PathSpec::parse(path)?;
        Ok(self.walk(&spec).await?.found_id())
    }

    /// Resolve `path`, then fetch `fields` for the object with one
    /// metadata call.
    pub async fn resolve(&self, path: &str, fields: &[ObjectField]) -> Result<Option<RemoteObject>> {
        let Some(id) = self.resolve_id(path).await? else {
            return Ok(None);
        };

        let object = self.store.get_object(&id, fields).await?;
        Ok(Some(object))
    }
}
