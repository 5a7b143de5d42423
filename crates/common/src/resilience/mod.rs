//! Resilience patterns for transient remote failures
//!
//! Two retry layers share these primitives:
//! - the transport wrapper, which repeats a single HTTP call with **linear**
//!   backoff until it sees a definitive response
//! - the operation orchestrator, which repeats a whole unit of work (fresh
//!   credential included) with **exponential** backoff
//!
//! Policies are plain values; the loops that consume them live next to the
//! code they protect.

pub mod retry;

pub use retry::{BackoffStrategy, RetryPolicy};
