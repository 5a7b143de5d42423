//! # DocBridge Infrastructure
//!
//! HTTP implementations of the `docbridge-core` ports.
//!
//! This crate contains:
//! - The retrying HTTP transport (`http`)
//! - Identity-provider and document API clients (`graph`)
//! - Configuration loading from environment and files (`config`)
//! - Conversions from `reqwest` errors into domain errors (`errors`)
//!
//! ## Architecture
//! - Implements traits defined in `docbridge-core`
//! - Contains all network and filesystem I/O

pub mod config;
pub mod errors;
pub mod graph;
pub mod http;

// Re-export commonly used items
pub use errors::InfraError;
pub use graph::{ClientCredentialsProvider, GraphDocumentClient, SiteResolver};
pub use http::{retry_until_definitive, HttpClient, HttpClientBuilder};
