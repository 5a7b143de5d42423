//! User-facing diagnostic reports
//!
//! Produced on demand by `docbridge_core::diagnostics` and returned to the
//! caller; never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a connectivity test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_message: Option<String>,
    /// Ordered checklist; empty when connected.
    #[serde(default)]
    pub troubleshooting_steps: Vec<String>,
    /// Retries the orchestrator performed before giving up.
    pub retry_attempts_observed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl DiagnosticReport {
    pub fn connected() -> Self {
        Self {
            connected: true,
            error: None,
            friendly_message: None,
            troubleshooting_steps: Vec::new(),
            retry_attempts_observed: 0,
            details: None,
        }
    }
}

/// Structured context attached to a failed connectivity test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub kind: String,
    pub message: String,
    pub hostname: String,
    pub site_path: String,
    pub document_library: String,
    pub checked_at: DateTime<Utc>,
}

/// Outcome of a single-file access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAccessReport {
    pub accessible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_details: Option<FileDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetails {
    pub path: String,
    /// Size of the raw content in bytes.
    pub content_length: usize,
    pub preview_content: String,
}
