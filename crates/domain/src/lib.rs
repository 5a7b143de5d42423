//! # DocBridge Domain
//!
//! Domain types for the remote document-store access layer.
//!
//! This crate contains:
//! - Error taxonomy and retry classification (`DocStoreError`, `ErrorClass`)
//! - Configuration structures (`DocBridgeConfig`, `RemoteSiteConfig`)
//! - Remote entity descriptors (`SiteId`, `DriveItem`, `Drive`)
//! - Diagnostic report types
//!
//! ## Architecture
//! - No dependencies on other DocBridge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
