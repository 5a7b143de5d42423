//! Error types used throughout the document-store access layer
//!
//! Failures are tagged at the boundary where they happen (transport, identity
//! provider, remote API) so that retryability can be decided by matching on
//! the tag instead of inspecting message text.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Network-level failure of a single HTTP call.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message")]
pub enum TransportError {
    /// The request or the response body did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The connection could not be established, was refused, reset, or the
    /// host could not be resolved.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(String),
}

/// How the identity provider failed to issue a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthFailure {
    /// Well-formed denial (bad secret, unknown client, wrong tenant).
    Rejected,
    /// Acquisition failed in a way that may succeed on another attempt, or a
    /// remote API refused a bearer token that a fresh one may fix.
    Unavailable,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "rejected"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Main error type for document-store operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum DocStoreError {
    /// A required configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(TransportError),

    #[error("Authentication error ({kind}): {message}")]
    Auth { kind: AuthFailure, message: String },

    /// The remote API reported that the resource does not exist.
    #[error("Not found (404): {0}")]
    NotFound(String),

    /// A success status whose body violates the expected contract.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Remote API returned status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a failed operation is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetryReason {
    Authentication,
    Timeout,
    Connection,
}

/// Retryability of a [`DocStoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    Retryable(RetryReason),
    Fatal,
}

impl ErrorClass {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}

impl DocStoreError {
    /// Shorthand for a rejected credential exchange.
    pub fn auth_rejected(message: impl Into<String>) -> Self {
        Self::Auth { kind: AuthFailure::Rejected, message: message.into() }
    }

    /// Shorthand for a transient authentication failure.
    pub fn auth_unavailable(message: impl Into<String>) -> Self {
        Self::Auth { kind: AuthFailure::Unavailable, message: message.into() }
    }

    /// Classify the error for the operation-level retry loop.
    ///
    /// Authentication, timeout and connection-level failures are retryable;
    /// everything else (configuration, rejected credentials, 404, malformed
    /// responses, other statuses) is fatal.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Self::Transport(TransportError::Timeout(_)) => {
                ErrorClass::Retryable(RetryReason::Timeout)
            }
            Self::Transport(TransportError::Connection(_) | TransportError::Request(_)) => {
                ErrorClass::Retryable(RetryReason::Connection)
            }
            Self::Auth { kind: AuthFailure::Unavailable, .. } => {
                ErrorClass::Retryable(RetryReason::Authentication)
            }
            Self::Auth { kind: AuthFailure::Rejected, .. }
            | Self::Config(_)
            | Self::NotFound(_)
            | Self::MalformedResponse(_)
            | Self::Http { .. }
            | Self::Internal(_) => ErrorClass::Fatal,
        }
    }

    /// Stable, lowercase name of the variant for reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Transport(TransportError::Timeout(_)) => "timeout",
            Self::Transport(_) => "transport",
            Self::Auth { .. } => "authentication",
            Self::NotFound(_) => "not_found",
            Self::MalformedResponse(_) => "malformed_response",
            Self::Http { .. } => "http",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<TransportError> for DocStoreError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

/// Final error of an orchestrated operation, annotated with the number of
/// retries performed before giving up.
///
/// `retries` counts attempts after the first one, so a fatal error on the
/// first attempt reports `0` and an operation that exhausted a budget of
/// three retries reports `3`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{error} (after {retries} retries)")]
pub struct OperationError {
    pub retries: u32,
    #[source]
    pub error: DocStoreError,
}

impl OperationError {
    pub fn new(error: DocStoreError, retries: u32) -> Self {
        Self { retries, error }
    }

    /// Total number of attempts made (first attempt plus retries).
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }

    pub fn into_inner(self) -> DocStoreError {
        self.error
    }
}

impl From<DocStoreError> for OperationError {
    fn from(error: DocStoreError) -> Self {
        Self::new(error, 0)
    }
}

/// Result type alias for single-step document-store calls
pub type Result<T> = std::result::Result<T, DocStoreError>;

/// Result type alias for orchestrated operations
pub type OperationResult<T> = std::result::Result<T, OperationError>;
