//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the mirror crates:
//! - Logging and tracing setup
//! - Configuration management
//!
//! ## Overview
//!
//! This crate establishes the logging conventions and the validated
//! configuration that `core-service` turns into a running mirror.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, ResolutionMode};
pub use error::{Error, Result};
