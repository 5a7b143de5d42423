//! Configuration structures
//!
//! Loaded once at startup by `docbridge_infra::config` and never mutated
//! afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DOCUMENT_LIBRARY, DEFAULT_GRAPH_BASE_URL, DEFAULT_GRAPH_SCOPE, DEFAULT_LOGIN_BASE_URL,
    DEFAULT_OPERATION_BASE_DELAY_MS, DEFAULT_OPERATION_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_TRANSPORT_BASE_DELAY_MS, DEFAULT_TRANSPORT_MAX_ATTEMPTS,
};
use crate::errors::{DocStoreError, Result};

/// Top-level configuration for the access layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocBridgeConfig {
    pub credentials: ClientCredentials,
    pub site: RemoteSiteConfig,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub retry: RetrySettings,
}

impl DocBridgeConfig {
    /// Check that every required value is present.
    ///
    /// # Errors
    /// Returns `DocStoreError::Config` naming the first missing value.
    pub fn validate(&self) -> Result<()> {
        self.credentials.validate()?;
        self.site.validate()?;
        if self.retry.transport_max_attempts == 0 {
            return Err(DocStoreError::Config(
                "transport_max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Service principal used for the client-credentials exchange.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// # Errors
    /// Returns `DocStoreError::Config` if tenant, client id or secret is blank.
    pub fn validate(&self) -> Result<()> {
        require("tenant_id", &self.tenant_id)?;
        require("client_id", &self.client_id)?;
        require("client_secret", &self.client_secret)
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Logical location of the remote document collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteSiteConfig {
    /// Tenant host, e.g. `contoso.sharepoint.com`
    pub hostname: String,
    /// Server-relative site path, e.g. `/sites/Thelounge`
    pub site_path: String,
    /// Library that relative file paths are resolved against. Empty means the
    /// drive root.
    #[serde(default = "default_document_library")]
    pub document_library: String,
}

impl RemoteSiteConfig {
    pub fn new(hostname: impl Into<String>, site_path: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            site_path: site_path.into(),
            document_library: default_document_library(),
        }
    }

    #[must_use]
    pub fn with_document_library(mut self, library: impl Into<String>) -> Self {
        self.document_library = library.into();
        self
    }

    /// # Errors
    /// Returns `DocStoreError::Config` if hostname or site path is blank.
    pub fn validate(&self) -> Result<()> {
        require("hostname", &self.hostname)?;
        require("site_path", &self.site_path)
    }

    /// Site path with exactly one leading slash.
    pub fn normalized_site_path(&self) -> String {
        format!("/{}", self.site_path.trim().trim_matches('/'))
    }
}

/// Remote endpoints; overridable so tests can target a mock server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EndpointConfig {
    #[serde(default = "default_graph_base_url")]
    pub graph_base_url: String,
    #[serde(default = "default_login_base_url")]
    pub login_base_url: String,
    #[serde(default = "default_scope")]
    pub scope: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            graph_base_url: default_graph_base_url(),
            login_base_url: default_login_base_url(),
            scope: default_scope(),
        }
    }
}

/// Retry budgets for the two retry layers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrySettings {
    #[serde(default = "default_transport_max_attempts")]
    pub transport_max_attempts: u32,
    #[serde(default = "default_transport_base_delay_ms")]
    pub transport_base_delay_ms: u64,
    #[serde(default = "default_operation_max_retries")]
    pub operation_max_retries: u32,
    #[serde(default = "default_operation_base_delay_ms")]
    pub operation_base_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            transport_max_attempts: DEFAULT_TRANSPORT_MAX_ATTEMPTS,
            transport_base_delay_ms: DEFAULT_TRANSPORT_BASE_DELAY_MS,
            operation_max_retries: DEFAULT_OPERATION_MAX_RETRIES,
            operation_base_delay_ms: DEFAULT_OPERATION_BASE_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DocStoreError::Config(format!("{name} is required but was not provided")));
    }
    Ok(())
}

fn default_document_library() -> String {
    DEFAULT_DOCUMENT_LIBRARY.to_string()
}

fn default_graph_base_url() -> String {
    DEFAULT_GRAPH_BASE_URL.to_string()
}

fn default_login_base_url() -> String {
    DEFAULT_LOGIN_BASE_URL.to_string()
}

fn default_scope() -> String {
    DEFAULT_GRAPH_SCOPE.to_string()
}

const fn default_transport_max_attempts() -> u32 {
    DEFAULT_TRANSPORT_MAX_ATTEMPTS
}

const fn default_transport_base_delay_ms() -> u64 {
    DEFAULT_TRANSPORT_BASE_DELAY_MS
}

const fn default_operation_max_retries() -> u32 {
    DEFAULT_OPERATION_MAX_RETRIES
}

const fn default_operation_base_delay_ms() -> u64 {
    DEFAULT_OPERATION_BASE_DELAY_MS
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
