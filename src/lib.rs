//! Workspace façade crate.
//!
//! Re-exports `core-service` so hosts can depend on `drive-mirror` and pick
//! the bridge set through feature flags instead of wiring each crate.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
