//! # DocBridge Core
//!
//! Access-layer logic with no HTTP code of its own.
//!
//! This crate contains:
//! - Port interfaces (`TokenSource`, `DocumentStore`)
//! - The resilient operation orchestrator (`ResilientExecutor`)
//! - Connectivity and file-access diagnostics (`Diagnostics`)
//!
//! ## Architecture Principles
//! - Depends only on `docbridge-common` and `docbridge-domain`
//! - All remote access goes through the port traits
//! - Every piece is testable with in-memory stubs

pub mod diagnostics;
pub mod ports;
pub mod resilience;

pub use diagnostics::{Diagnostics, FailureCategory};
pub use ports::{DocumentStore, TokenSource};
pub use resilience::ResilientExecutor;
