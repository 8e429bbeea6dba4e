//! # Host Bridge Traits
//!
//! Capability contracts between the path/sync core and the outside world.
//!
//! ## Traits
//!
//! - [`RemoteStore`](remote::RemoteStore) - identifier-addressed remote object store
//!   (listing with pagination and field projection, create, reparent, rename,
//!   delete, upload, copy)
//! - [`FileSystemAccess`](storage::FileSystemAccess) - read-only local tree access
//! - [`HttpClient`](http::HttpClient) - transport used by store connectors
//! - [`LoggerSink`](log::LoggerSink) - forward structured logs to a host
//!
//! ## Error Handling
//!
//! Every trait returns [`BridgeError`](error::BridgeError). Implementations
//! convert their native failures into it and keep the message actionable
//! (object id, path, HTTP status).
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`; the core shares them as `Arc<dyn _>`.

pub mod error;
pub mod http;
pub mod log;
pub mod remote;
pub mod storage;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use remote::{
    ChildQuery, KindFilter, ObjectField, ObjectKind, ObjectPage, RemoteObject, RemoteStore,
};
pub use storage::{FileMetadata, FileSystemAccess, LocalEntryKind};
