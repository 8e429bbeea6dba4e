//! # Path & Sync Module
//!
//! Path-oriented view over an identifier-addressed remote store.
//!
//! ## Overview
//!
//! The remote store addresses objects by opaque id and allows several
//! objects with the same name under one parent. This crate provides:
//! - Parsing of slash-delimited paths with `\/` escapes
//! - Resolving a path into an object id, segment by segment
//! - Provisioning the missing folders of a path
//! - One-way mirroring of a local tree, transferring only missing or stale files
//!
//! ## Components
//!
//! - **Path** (`path`): `PathSpec` parsing and escaping rules
//! - **Listing** (`listing`): paginated child listings with an optional item cap
//! - **Resolver** (`resolver`): `PathResolver`, read-only path walks
//! - **Provisioner** (`provisioner`): `FolderProvisioner`, look-up-or-create per segment
//! - **Synchronizer** (`synchronizer`): `TreeSynchronizer`, recursive local-to-remote sync
//! - **Confirmation** (`confirmation`): `ConfirmationPolicy` for destructive operations
//!
//! Nothing is cached between calls; every operation re-resolves from the root.

pub mod confirmation;
pub mod error;
pub mod listing;
pub mod locks;
pub mod path;
pub mod provisioner;
pub mod resolver;
pub mod synchronizer;

#[cfg(test)]
mod test_support;

pub use confirmation::{AlwaysProceed, ConfirmationPolicy, Decision, ProceedIf};
pub use error::{Result, SyncError};
pub use listing::{collect_children, Listing};
pub use path::PathSpec;
pub use provisioner::FolderProvisioner;
pub use resolver::{PathResolver, Walk};
pub use synchronizer::{decide, SyncDecision, SyncOptions, SyncReport, TreeSynchronizer};
