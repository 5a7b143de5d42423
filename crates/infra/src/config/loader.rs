//! Configuration loader
//!
//! Loads the access-layer configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Whatever the source, the result is validated before it is returned.
//!
//! ## Environment Variables
//! Required:
//! - `AZURE_AD_TENANT_ID`, `AZURE_AD_CLIENT_ID`, `AZURE_AD_CLIENT_SECRET`
//! - `DOCBRIDGE_SITE_HOSTNAME`: e.g. `contoso.sharepoint.com`
//! - `DOCBRIDGE_SITE_PATH`: e.g. `/sites/Thelounge`
//!
//! Optional:
//! - `DOCBRIDGE_DOCUMENT_LIBRARY` (default `Shared Documents`)
//! - `DOCBRIDGE_GRAPH_BASE_URL`, `DOCBRIDGE_LOGIN_BASE_URL`, `DOCBRIDGE_SCOPE`
//! - `DOCBRIDGE_TRANSPORT_MAX_ATTEMPTS`, `DOCBRIDGE_TRANSPORT_BASE_DELAY_MS`
//! - `DOCBRIDGE_MAX_RETRIES`, `DOCBRIDGE_RETRY_BASE_DELAY_MS`
//! - `DOCBRIDGE_REQUEST_TIMEOUT_SECS`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./docbridge.{json,toml}` then `./config.{json,toml}`
//! 2. The same names in the parent and grandparent directories
//! 3. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use docbridge_domain::{
    ClientCredentials, DocBridgeConfig, DocStoreError, EndpointConfig, RemoteSiteConfig, Result,
    RetrySettings,
};
use url::Url;

const CONFIG_FILE_NAMES: [&str; 4] =
    ["docbridge.json", "docbridge.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `DocStoreError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<DocBridgeConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `DocStoreError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<DocBridgeConfig> {
    let credentials = ClientCredentials::new(
        env_var("AZURE_AD_TENANT_ID")?,
        env_var("AZURE_AD_CLIENT_ID")?,
        env_var("AZURE_AD_CLIENT_SECRET")?,
    );

    let mut site =
        RemoteSiteConfig::new(env_var("DOCBRIDGE_SITE_HOSTNAME")?, env_var("DOCBRIDGE_SITE_PATH")?);
    if let Some(library) = env_opt("DOCBRIDGE_DOCUMENT_LIBRARY") {
        site = site.with_document_library(library);
    }

    let mut endpoints = EndpointConfig::default();
    if let Some(url) = env_opt("DOCBRIDGE_GRAPH_BASE_URL") {
        endpoints.graph_base_url = url;
    }
    if let Some(url) = env_opt("DOCBRIDGE_LOGIN_BASE_URL") {
        endpoints.login_base_url = url;
    }
    if let Some(scope) = env_opt("DOCBRIDGE_SCOPE") {
        endpoints.scope = scope;
    }

    let defaults = RetrySettings::default();
    let retry = RetrySettings {
        transport_max_attempts: env_parse(
            "DOCBRIDGE_TRANSPORT_MAX_ATTEMPTS",
            defaults.transport_max_attempts,
        )?,
        transport_base_delay_ms: env_parse(
            "DOCBRIDGE_TRANSPORT_BASE_DELAY_MS",
            defaults.transport_base_delay_ms,
        )?,
        operation_max_retries: env_parse("DOCBRIDGE_MAX_RETRIES", defaults.operation_max_retries)?,
        operation_base_delay_ms: env_parse(
            "DOCBRIDGE_RETRY_BASE_DELAY_MS",
            defaults.operation_base_delay_ms,
        )?,
        request_timeout_secs: env_parse(
            "DOCBRIDGE_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout_secs,
        )?,
    };

    finish(DocBridgeConfig { credentials, site, endpoints, retry })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `DocStoreError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<DocBridgeConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DocStoreError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DocStoreError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DocStoreError::Config(format!("Failed to read config file: {}", e)))?;

    finish(parse_config(&contents, &config_path)?)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<DocBridgeConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DocStoreError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DocStoreError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(DocStoreError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Validate required values and endpoint URLs.
fn finish(config: DocBridgeConfig) -> Result<DocBridgeConfig> {
    config.validate()?;
    check_url("graph_base_url", &config.endpoints.graph_base_url)?;
    check_url("login_base_url", &config.endpoints.login_base_url)?;
    Ok(config)
}

fn check_url(name: &str, value: &str) -> Result<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| DocStoreError::Config(format!("Invalid {name} '{value}': {e}")))
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `DocStoreError::Config` if the variable is not set or blank.
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        DocStoreError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional environment variable; blank counts as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional numeric environment variable, falling back to `default`.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| DocStoreError::Config(format!("Invalid value for {}: {}", key, e))),
        None => Ok(default),
    }
}
