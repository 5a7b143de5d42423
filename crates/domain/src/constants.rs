//! Application constants
//!
//! Centralized location for the defaults used by configuration and the
//! remote API clients.

// Remote endpoints
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
pub const DEFAULT_DOCUMENT_LIBRARY: &str = "Shared Documents";

// Transport retry (linear backoff: attempt * base delay)
pub const DEFAULT_TRANSPORT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TRANSPORT_BASE_DELAY_MS: u64 = 1000;

// Operation retry (exponential backoff: base delay * 2^(retry - 1))
pub const DEFAULT_OPERATION_MAX_RETRIES: u32 = 3;
pub const DEFAULT_OPERATION_BASE_DELAY_MS: u64 = 1000;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Diagnostics
pub const FILE_PREVIEW_CHARS: usize = 200;
pub const PREVIEW_TRUNCATE_SUFFIX: &str = "...";
