//! Document operations against the remote drive API
//!
//! Every operation runs inside [`ResilientExecutor::with_resilient_token`]:
//! a fresh token per attempt, the site id from the shared [`SiteResolver`],
//! and HTTP through the retrying [`HttpClient`].

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use docbridge_core::ports::{DocumentStore, TokenSource};
use docbridge_core::ResilientExecutor;
use docbridge_domain::{
    BearerCredential, DocBridgeConfig, DocStoreError, Drive, DriveItem, OperationResult,
    RemoteSiteConfig, Result, SiteId,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{encode_segments, ensure_success, ClientCredentialsProvider, SiteResolver};
use crate::errors::conversions::from_http;
use crate::http::HttpClient;

/// Read-only client for one site's document library
pub struct GraphDocumentClient {
    http: Arc<HttpClient>,
    executor: ResilientExecutor,
    sites: SiteResolver,
    site: RemoteSiteConfig,
    graph_base_url: String,
}

impl GraphDocumentClient {
    /// Wire up the full stack from a validated configuration.
    ///
    /// Each client owns its site-id cache. Build one client per process and
    /// share it behind an `Arc`; a second client repeats the site lookup.
    ///
    /// # Errors
    /// `DocStoreError::Config` if the configuration is incomplete or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &DocBridgeConfig) -> Result<Self> {
        config.validate()?;
        let http = Arc::new(HttpClient::from_settings(&config.retry)?);
        let tokens = Arc::new(ClientCredentialsProvider::new(
            http.clone(),
            config.credentials.clone(),
            &config.endpoints,
        )?);
        let executor = ResilientExecutor::from_settings(tokens, &config.retry);

        Ok(Self::new(http, executor, &config.endpoints.graph_base_url, config.site.clone()))
    }

    /// Assemble a client from parts; used by tests to inject a token source.
    pub fn new(
        http: Arc<HttpClient>,
        executor: ResilientExecutor,
        graph_base_url: &str,
        site: RemoteSiteConfig,
    ) -> Self {
        let graph_base_url = graph_base_url.trim_end_matches('/').to_string();
        let sites = SiteResolver::new(http.clone(), &graph_base_url, site.clone());
        Self { http, executor, sites, site, graph_base_url }
    }

    /// Convenience constructor with the default orchestration policy.
    pub fn with_token_source(
        http: Arc<HttpClient>,
        tokens: Arc<dyn TokenSource>,
        graph_base_url: &str,
        site: RemoteSiteConfig,
    ) -> Self {
        Self::new(http, ResilientExecutor::new(tokens), graph_base_url, site)
    }

    pub fn site_resolver(&self) -> &SiteResolver {
        &self.sites
    }

    /// Fetch the raw bytes of a file in the document library.
    #[instrument(skip(self))]
    pub async fn get_file_content(&self, path: &str) -> OperationResult<Bytes> {
        let content = self
            .executor
            .with_resilient_token(|credential| self.fetch_content(credential, path))
            .await?;
        info!(path, bytes = content.len(), "Fetched file content");
        Ok(content)
    }

    /// Fetch a file and decode it as UTF-8, replacing invalid sequences.
    pub async fn get_file_text(&self, path: &str) -> OperationResult<String> {
        let content = self.get_file_content(path).await?;
        Ok(String::from_utf8_lossy(&content).into_owned())
    }

    /// List a folder of the document library; `""` lists the library root.
    #[instrument(skip(self))]
    pub async fn list_files(&self, folder_path: &str) -> OperationResult<Vec<DriveItem>> {
        let items = self
            .executor
            .with_resilient_token(|credential| self.fetch_listing(credential, folder_path))
            .await?;
        info!(folder = folder_path, entries = items.len(), "Listed folder");
        Ok(items)
    }

    /// List the document libraries of the site.
    #[instrument(skip(self))]
    pub async fn list_drives(&self) -> OperationResult<Vec<Drive>> {
        self.executor
            .with_resilient_token(|credential| async move {
                let site_id = self.sites.resolve(&credential).await?;
                let url = format!("{}/sites/{}/drives", self.graph_base_url, site_id);
                let body = self.get_json(&url, &credential).await?;
                parse_value_array(body, "malformed drives response")
            })
            .await
    }

    /// Fetch the raw bytes of an item by its id.
    ///
    /// Search and listing results identify items by id; `drive_id` selects the
    /// document library holding the item, `None` meaning the site's default
    /// drive.
    #[instrument(skip(self))]
    pub async fn get_item_content(
        &self,
        item_id: &str,
        drive_id: Option<&str>,
    ) -> OperationResult<Bytes> {
        let content = self
            .executor
            .with_resilient_token(|credential| async move {
                let drive = self.drive_url(&credential, drive_id).await?;
                let url = format!("{drive}/items/{}/content", urlencoding::encode(item_id));
                debug!(url = %url, "Downloading item");
                self.get_bytes(&url, &credential).await
            })
            .await?;
        info!(item_id, bytes = content.len(), "Fetched item content");
        Ok(content)
    }

    /// Search a drive by name and content; `None` searches the site's default
    /// drive.
    #[instrument(skip(self))]
    pub async fn search_files(
        &self,
        query: &str,
        drive_id: Option<&str>,
    ) -> OperationResult<Vec<DriveItem>> {
        let escaped = urlencoding::encode(&query.replace('\'', "''")).into_owned();
        self.executor
            .with_resilient_token(|credential| {
                let escaped = escaped.clone();
                async move {
                    let drive = self.drive_url(&credential, drive_id).await?;
                    let url = format!("{drive}/root/search(q='{escaped}')");
                    let body = self.get_json(&url, &credential).await?;
                    parse_value_array(body, "malformed search response")
                }
            })
            .await
    }

    /// `{graph}/drives/{id}` for an explicit drive, else the site's default
    /// drive, which needs the site id.
    async fn drive_url(
        &self,
        credential: &BearerCredential,
        drive_id: Option<&str>,
    ) -> Result<String> {
        match drive_id {
            Some(id) => Ok(format!("{}/drives/{}", self.graph_base_url, urlencoding::encode(id))),
            None => {
                let site_id = self.sites.resolve(credential).await?;
                Ok(format!("{}/sites/{}/drive", self.graph_base_url, site_id))
            }
        }
    }

    async fn fetch_content(&self, credential: BearerCredential, path: &str) -> Result<Bytes> {
        let site_id = self.sites.resolve(&credential).await?;
        let url = self.item_url(&site_id, path, "content");
        debug!(url = %url, "Downloading file");
        self.get_bytes(&url, &credential).await
    }

    async fn get_bytes(&self, url: &str, credential: &BearerCredential) -> Result<Bytes> {
        let request = self.http.request(Method::GET, url).bearer_auth(credential.access_token());
        let response = ensure_success(self.http.send(request).await?).await?;
        response.bytes().await.map_err(from_http)
    }

    async fn fetch_listing(
        &self,
        credential: BearerCredential,
        folder_path: &str,
    ) -> Result<Vec<DriveItem>> {
        let site_id = self.sites.resolve(&credential).await?;
        let url = self.item_url(&site_id, folder_path, "children");
        let body = self.get_json(&url, &credential).await?;
        parse_value_array(body, "malformed listing response")
    }

    async fn get_json(&self, url: &str, credential: &BearerCredential) -> Result<Value> {
        debug!(url = %url, "GET");
        let request = self.http.request(Method::GET, url).bearer_auth(credential.access_token());
        let response = ensure_success(self.http.send(request).await?).await?;
        let text = response.text().await.map_err(from_http)?;
        serde_json::from_str(&text)
            .map_err(|e| DocStoreError::MalformedResponse(format!("response is not JSON: {e}")))
    }

    /// `{graph}/sites/{id}/drive/root:/{library/path}:/{suffix}`, or
    /// `{graph}/sites/{id}/drive/root/{suffix}` when the path is empty.
    fn item_url(&self, site_id: &SiteId, relative: &str, suffix: &str) -> String {
        let encoded = encode_segments([self.site.document_library.as_str(), relative]);
        if encoded.is_empty() {
            format!("{}/sites/{}/drive/root/{}", self.graph_base_url, site_id, suffix)
        } else {
            format!("{}/sites/{}/drive/root:/{}:/{}", self.graph_base_url, site_id, encoded, suffix)
        }
    }
}

/// Extract the `value` array of a collection response.
fn parse_value_array<T: DeserializeOwned>(body: Value, context: &str) -> Result<Vec<T>> {
    let Some(Value::Array(entries)) = body.get("value").cloned() else {
        return Err(DocStoreError::MalformedResponse(context.to_string()));
    };

    entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value(entry)
                .map_err(|e| DocStoreError::MalformedResponse(format!("{context}: {e}")))
        })
        .collect()
}

#[async_trait]
impl DocumentStore for GraphDocumentClient {
    async fn get_file_content(&self, path: &str) -> OperationResult<Bytes> {
        GraphDocumentClient::get_file_content(self, path).await
    }

    async fn list_files(&self, folder_path: &str) -> OperationResult<Vec<DriveItem>> {
        GraphDocumentClient::list_files(self, folder_path).await
    }

    fn site(&self) -> &RemoteSiteConfig {
        &self.site
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(library: &str) -> GraphDocumentClient {
        let http = Arc::new(HttpClient::new().unwrap());
        let tokens: Arc<dyn TokenSource> = Arc::new(ClientCredentialsProvider::from_parts(
            http.clone(),
            docbridge_domain::ClientCredentials::new("t", "c", "s"),
            &docbridge_domain::EndpointConfig::default(),
        ));
        GraphDocumentClient::with_token_source(
            http,
            tokens,
            "https://graph.example/v1.0",
            RemoteSiteConfig::new("contoso.sharepoint.com", "/sites/Intranet")
                .with_document_library(library),
        )
    }

    #[test]
    fn item_url_prefixes_library() {
        let url = client("Shared Documents").item_url(
            &SiteId::new("site-123"),
            "Exp1004.csv",
            "content",
        );
        assert_eq!(
            url,
            "https://graph.example/v1.0/sites/site-123/drive/root:/Shared%20Documents/Exp1004.csv:/content"
        );
    }

    #[test]
    fn empty_library_and_folder_use_root_children() {
        let url = client("").item_url(&SiteId::new("site-123"), "", "children");
        assert_eq!(url, "https://graph.example/v1.0/sites/site-123/drive/root/children");
    }

    #[test]
    fn listing_requires_value_array() {
        let err = parse_value_array::<DriveItem>(
            serde_json::json!({ "value": "nope" }),
            "malformed listing response",
        )
        .unwrap_err();
        assert_eq!(err, DocStoreError::MalformedResponse("malformed listing response".into()));

        let empty: Vec<DriveItem> =
            parse_value_array(serde_json::json!({ "value": [] }), "ctx").unwrap();
        assert!(empty.is_empty());
    }
}
