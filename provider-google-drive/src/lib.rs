//! # Google Drive Provider
//!
//! Implements `RemoteStore` for Google Drive API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - Scoped child listing (`'<parent>' in parents and name = '<name>'`) with
//!   page tokens and field projection
//! - Folder creation, reparenting, rename, delete and copy
//! - Multipart uploads of local files
//!
//! Credentials are not handled here: the connector is given a ready access
//! token and an `HttpClient` that owns retry and backoff.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::{GoogleDriveError, Result};
