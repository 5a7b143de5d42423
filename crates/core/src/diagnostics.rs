//! Connectivity and file-access diagnostics
//!
//! Turns failures of the document operations into user-facing reports with a
//! friendly message and a troubleshooting checklist. Diagnostics never fail:
//! every error ends up inside the returned report.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use docbridge_domain::constants::{FILE_PREVIEW_CHARS, PREVIEW_TRUNCATE_SUFFIX};
use docbridge_domain::{
    DiagnosticReport, DocStoreError, ErrorDetails, FileAccessReport, FileDetails, OperationError,
    TransportError,
};
use tracing::{info, instrument, warn};

use crate::ports::DocumentStore;

/// Checklist shown for every failed connectivity test
const BASE_TROUBLESHOOTING_STEPS: [&str; 5] = [
    "Check your network connection",
    "Verify the document site is accessible",
    "Ensure Azure AD credentials are correct",
    "Verify the app has proper permissions to access the document site",
    "Try again in a few minutes",
];

/// Failure category used to pick the friendly message and extra steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    /// Credential exchange failed or the API refused the token
    Authentication,
    /// Site, library or path does not exist
    NotFound,
    /// The remote side did not answer in time
    Timeout,
    /// Anything else
    General,
}

impl FailureCategory {
    /// Categorize an error by its tag.
    ///
    /// `Http` errors carry only a status and a body, so their text is checked
    /// for the usual markers as a fallback.
    pub fn of(error: &DocStoreError) -> Self {
        match error {
            DocStoreError::Auth { .. } => Self::Authentication,
            DocStoreError::NotFound(_) => Self::NotFound,
            DocStoreError::Transport(TransportError::Timeout(_)) => Self::Timeout,
            DocStoreError::Http { status: 404, .. } => Self::NotFound,
            DocStoreError::Http { status: 401 | 403, .. } => Self::Authentication,
            DocStoreError::Http { status: 408 | 504, .. } => Self::Timeout,
            DocStoreError::Http { body, .. } => Self::from_text(body),
            _ => Self::General,
        }
    }

    fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("token") || lower.contains("auth") {
            Self::Authentication
        } else if lower.contains("404") {
            Self::NotFound
        } else if lower.contains("timeout") || lower.contains("timed out") {
            Self::Timeout
        } else {
            Self::General
        }
    }

    /// Returns user-friendly message for this category
    pub fn friendly_message(&self) -> &'static str {
        match self {
            Self::Authentication => "Authentication failed when connecting to the document store.",
            Self::NotFound => "The document site or document library was not found.",
            Self::Timeout => "The connection to the document store timed out.",
            Self::General => {
                "The document store could not be reached. Please try again or contact support if \
                 the problem persists."
            }
        }
    }

    /// Steps appended to the base checklist
    pub fn extra_steps(&self) -> &'static [&'static str] {
        match self {
            Self::Authentication => &[
                "Check if the Azure AD credentials are correct",
                "Verify the app has proper permissions in Azure AD",
                "Ensure the tenant ID is correct",
            ],
            Self::NotFound => &[
                "Verify the site hostname and path are correct",
                "Check if the document library name is correct",
                "Ensure the file path exists in the document library",
            ],
            Self::Timeout => &[
                "Check your network connection speed and stability",
                "The document site might be temporarily unavailable or overloaded",
                "Try increasing the connection timeout settings",
            ],
            Self::General => &[],
        }
    }

    /// Full ordered checklist: base steps followed by category steps
    pub fn troubleshooting_steps(&self) -> Vec<String> {
        BASE_TROUBLESHOOTING_STEPS
            .iter()
            .chain(self.extra_steps())
            .map(|step| (*step).to_string())
            .collect()
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "Authentication Failed"),
            Self::NotFound => write!(f, "Not Found"),
            Self::Timeout => write!(f, "Timeout"),
            Self::General => write!(f, "Connection Failed"),
        }
    }
}

/// Diagnostics over a [`DocumentStore`]
#[derive(Clone)]
pub struct Diagnostics {
    store: Arc<dyn DocumentStore>,
}

impl Diagnostics {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Probe the store by listing the library root.
    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> DiagnosticReport {
        match self.store.list_files("").await {
            Ok(items) => {
                info!(entries = items.len(), "Document store connection succeeded");
                DiagnosticReport::connected()
            }
            Err(err) => {
                warn!(retries = err.retries, error = %err.error, "Document store connection failed");
                self.failure_report(&err)
            }
        }
    }

    /// Fetch one file and report its size and a short preview.
    #[instrument(skip(self))]
    pub async fn verify_file_access(&self, path: &str) -> FileAccessReport {
        match self.store.get_file_content(path).await {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                info!(path, bytes = bytes.len(), "File is accessible");
                FileAccessReport {
                    accessible: true,
                    file_details: Some(FileDetails {
                        path: path.to_string(),
                        content_length: bytes.len(),
                        preview_content: preview(&text),
                    }),
                    error: None,
                }
            }
            Err(err) => {
                warn!(path, error = %err.error, "File is not accessible");
                FileAccessReport {
                    accessible: false,
                    file_details: None,
                    error: Some(format!("Could not access file \"{path}\": {}", err.error)),
                }
            }
        }
    }

    fn failure_report(&self, err: &OperationError) -> DiagnosticReport {
        let category = FailureCategory::of(&err.error);
        let message = err.error.to_string();
        let site = self.store.site();

        DiagnosticReport {
            connected: false,
            error: Some(format!("Could not connect to the document store: {message}")),
            friendly_message: Some(category.friendly_message().to_string()),
            troubleshooting_steps: category.troubleshooting_steps(),
            retry_attempts_observed: err.retries,
            details: Some(ErrorDetails {
                kind: err.error.kind().to_string(),
                message,
                hostname: site.hostname.clone(),
                site_path: site.site_path.clone(),
                document_library: site.document_library.clone(),
                checked_at: Utc::now(),
            }),
        }
    }
}

/// First [`FILE_PREVIEW_CHARS`] characters, with a marker when truncated
fn preview(text: &str) -> String {
    let mut chars = text.char_indices();
    match chars.nth(FILE_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{PREVIEW_TRUNCATE_SUFFIX}", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;
    use docbridge_domain::{DriveItem, OperationResult, RemoteSiteConfig};

    use super::*;

    struct StubStore {
        site: RemoteSiteConfig,
        listing: OperationResult<Vec<DriveItem>>,
        content: OperationResult<Bytes>,
        calls: AtomicUsize,
    }

    impl StubStore {
        fn new(
            listing: OperationResult<Vec<DriveItem>>,
            content: OperationResult<Bytes>,
        ) -> Arc<Self> {
            Arc::new(Self {
                site: RemoteSiteConfig::new("contoso.sharepoint.com", "/sites/Intranet"),
                listing,
                content,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DocumentStore for StubStore {
        async fn get_file_content(&self, _path: &str) -> OperationResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.content.clone()
        }

        async fn list_files(&self, _folder_path: &str) -> OperationResult<Vec<DriveItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.listing.clone()
        }

        fn site(&self) -> &RemoteSiteConfig {
            &self.site
        }
    }

    fn failed<T>(error: DocStoreError, retries: u32) -> OperationResult<T> {
        Err(OperationError::new(error, retries))
    }

    #[tokio::test]
    async fn connected_report_has_no_steps() {
        let store = StubStore::new(Ok(Vec::new()), Ok(Bytes::new()));
        let report = Diagnostics::new(store.clone()).test_connection().await;

        assert!(report.connected);
        assert!(report.error.is_none());
        assert!(report.troubleshooting_steps.is_empty());
        assert_eq!(report.retry_attempts_observed, 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_timeouts_report_three_retries() {
        let store = StubStore::new(
            failed(DocStoreError::Transport(TransportError::Timeout("timed out".into())), 3),
            Ok(Bytes::new()),
        );
        let report = Diagnostics::new(store).test_connection().await;

        assert!(!report.connected);
        assert_eq!(report.retry_attempts_observed, 3);
        assert_eq!(
            report.friendly_message.as_deref(),
            Some("The connection to the document store timed out.")
        );
        assert_eq!(report.troubleshooting_steps.len(), 8);
        assert_eq!(report.troubleshooting_steps[0], "Check your network connection");
        assert!(report
            .troubleshooting_steps
            .contains(&"Try increasing the connection timeout settings".to_string()));
        let details = report.details.unwrap();
        assert_eq!(details.kind, "timeout");
        assert_eq!(details.hostname, "contoso.sharepoint.com");
        assert_eq!(details.document_library, "Shared Documents");
    }

    #[tokio::test]
    async fn auth_failure_gets_credential_steps() {
        let store =
            StubStore::new(failed(DocStoreError::auth_rejected("invalid_client"), 0), Ok(Bytes::new()));
        let report = Diagnostics::new(store).test_connection().await;

        assert!(report.error.unwrap().starts_with("Could not connect to the document store: "));
        assert_eq!(
            report.friendly_message.as_deref(),
            Some("Authentication failed when connecting to the document store.")
        );
        assert!(report.troubleshooting_steps.contains(&"Ensure the tenant ID is correct".to_string()));
    }

    #[tokio::test]
    async fn unknown_failure_uses_generic_checklist() {
        let store = StubStore::new(
            failed(DocStoreError::MalformedResponse("malformed listing response".into()), 0),
            Ok(Bytes::new()),
        );
        let report = Diagnostics::new(store).test_connection().await;

        assert_eq!(report.troubleshooting_steps.len(), BASE_TROUBLESHOOTING_STEPS.len());
        assert_eq!(
            report.friendly_message.as_deref(),
            Some(FailureCategory::General.friendly_message())
        );
    }

    #[test]
    fn http_bodies_fall_back_to_text_markers() {
        let token = DocStoreError::Http { status: 400, body: "InvalidAuthenticationToken".into() };
        let missing = DocStoreError::Http { status: 404, body: String::new() };
        let slow = DocStoreError::Http { status: 500, body: "upstream timed out".into() };
        let other = DocStoreError::Http { status: 500, body: "boom".into() };

        assert_eq!(FailureCategory::of(&token), FailureCategory::Authentication);
        assert_eq!(FailureCategory::of(&missing), FailureCategory::NotFound);
        assert_eq!(FailureCategory::of(&slow), FailureCategory::Timeout);
        assert_eq!(FailureCategory::of(&other), FailureCategory::General);
    }

    #[tokio::test]
    async fn verify_reports_size_and_preview() {
        let store = StubStore::new(Ok(Vec::new()), Ok(Bytes::from_static(b"a,b\n1,2")));
        let report = Diagnostics::new(store).verify_file_access("Exp1004.csv").await;

        assert!(report.accessible);
        let details = report.file_details.unwrap();
        assert_eq!(details.path, "Exp1004.csv");
        assert_eq!(details.content_length, 7);
        assert_eq!(details.preview_content, "a,b\n1,2");
    }

    #[tokio::test]
    async fn verify_truncates_long_files() {
        let body = "x".repeat(250);
        let store = StubStore::new(Ok(Vec::new()), Ok(Bytes::from(body)));
        let report = Diagnostics::new(store).verify_file_access("big.txt").await;

        let preview = report.file_details.unwrap().preview_content;
        assert_eq!(preview.len(), 203);
        assert!(preview.ends_with("..."));
    }

    #[tokio::test]
    async fn verify_never_fails() {
        let store = StubStore::new(
            Ok(Vec::new()),
            failed(DocStoreError::NotFound("itemNotFound".into()), 0),
        );
        let report = Diagnostics::new(store).verify_file_access("missing.csv").await;

        assert!(!report.accessible);
        assert!(report.file_details.is_none());
        assert!(report.error.unwrap().starts_with("Could not access file \"missing.csv\": "));
    }

    #[test]
    fn preview_keeps_exact_length_untouched() {
        let text = "é".repeat(FILE_PREVIEW_CHARS);
        assert_eq!(preview(&text), text);
    }
}
