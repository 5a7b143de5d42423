//! Common utilities shared across DocBridge crates.
//!
//! # Feature Tiers
//!
//! - `runtime` (default): retry policies and backoff helpers that sleep on the
//!   Tokio timer

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

#[cfg(feature = "runtime")]
pub mod resilience;

#[cfg(feature = "runtime")]
pub use resilience::{BackoffStrategy, RetryPolicy};
