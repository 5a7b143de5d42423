//! Site-id lookup with a process-lifetime cache
//!
//! The first successful lookup fills the slot; every later call returns the
//! cached id without touching the network. Concurrent first callers share one
//! lookup. A failed lookup leaves the slot empty so the next call tries again.
//!
//! The slot belongs to the resolver, so the cache spans the process only when
//! a single client is shared.

use std::sync::Arc;

use docbridge_domain::{BearerCredential, DocStoreError, RemoteSiteConfig, Result, SiteId};
use reqwest::Method;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use super::{encode_segments, ensure_success};
use crate::errors::conversions::from_http;
use crate::http::HttpClient;

/// Resolves the configured site to its opaque id
pub struct SiteResolver {
    http: Arc<HttpClient>,
    graph_base_url: String,
    site: RemoteSiteConfig,
    slot: OnceCell<SiteId>,
}

impl SiteResolver {
    pub fn new(http: Arc<HttpClient>, graph_base_url: &str, site: RemoteSiteConfig) -> Self {
        Self {
            http,
            graph_base_url: graph_base_url.trim_end_matches('/').to_string(),
            site,
            slot: OnceCell::new(),
        }
    }

    /// Lookup URL: `{graph}/sites/{hostname}:{site_path}`
    pub fn lookup_url(&self) -> String {
        let path = encode_segments([self.site.normalized_site_path().as_str()]);
        format!("{}/sites/{}:/{}", self.graph_base_url, self.site.hostname.trim(), path)
    }

    /// Cached site id, if a lookup has succeeded.
    pub fn cached(&self) -> Option<SiteId> {
        self.slot.get().cloned()
    }

    /// Return the site id, looking it up with `credential` on first use.
    ///
    /// # Errors
    /// `NotFound` for a 404, `MalformedResponse` when the body has no string
    /// `id`, `Http`/`Auth` for other statuses, `Transport` when unreachable.
    #[instrument(skip(self, credential), fields(hostname = %self.site.hostname))]
    pub async fn resolve(&self, credential: &BearerCredential) -> Result<SiteId> {
        if let Some(id) = self.slot.get() {
            debug!(site_id = %id, "Using cached site id");
            return Ok(id.clone());
        }

        self.slot.get_or_try_init(|| self.lookup(credential)).await.cloned()
    }

    async fn lookup(&self, credential: &BearerCredential) -> Result<SiteId> {
        let url = self.lookup_url();
        debug!(url = %url, "Looking up site id");

        let request =
            self.http.request(Method::GET, &url).bearer_auth(credential.access_token());
        let response = ensure_success(self.http.send(request).await?).await?;
        let body: Value = response.json().await.map_err(from_http)?;

        let id = body.get("id").and_then(Value::as_str).filter(|id| !id.is_empty()).ok_or_else(
            || DocStoreError::MalformedResponse("site lookup response has no id".to_string()),
        )?;

        info!(site_id = %id, "Resolved site id");
        Ok(SiteId::new(id))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn resolver(server: &MockServer) -> SiteResolver {
        let http = Arc::new(
            HttpClient::builder()
                .base_backoff(Duration::from_millis(1))
                .max_attempts(2)
                .build()
                .unwrap(),
        );
        SiteResolver::new(
            http,
            &server.uri(),
            RemoteSiteConfig::new("contoso.sharepoint.com", "/sites/Thelounge"),
        )
    }

    fn credential() -> BearerCredential {
        BearerCredential::new("tok", None)
    }

    #[tokio::test]
    async fn sequential_resolves_hit_network_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/contoso.sharepoint.com:/sites/Thelounge"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "site-123" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver(&server);
        assert!(resolver.cached().is_none());

        for _ in 0..3 {
            assert_eq!(resolver.resolve(&credential()).await.unwrap().as_str(), "site-123");
        }
        assert_eq!(resolver.cached(), Some(SiteId::new("site-123")));
    }

    #[tokio::test]
    async fn concurrent_first_resolves_share_one_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/contoso.sharepoint.com:/sites/Thelounge"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "site-123" }))
                    .set_delay(Duration::from_millis(150)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let resolver = resolver(&server);
        let token = credential();
        let (a, b, c) = tokio::join!(
            resolver.resolve(&token),
            resolver.resolve(&token),
            resolver.resolve(&token)
        );

        for id in [a, b, c] {
            assert_eq!(id.unwrap().as_str(), "site-123");
        }
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_id_is_malformed_and_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "displayName": "Lounge" })),
            )
            .mount(&server)
            .await;

        let resolver = resolver(&server);
        let err = resolver.resolve(&credential()).await.unwrap_err();

        assert!(matches!(err, DocStoreError::MalformedResponse(_)));
        assert!(!err.classify().is_retryable());
        assert!(resolver.cached().is_none());
    }

    #[tokio::test]
    async fn failed_lookup_is_retried_on_next_call() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("itemNotFound"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "site-9" })),
            )
            .mount(&server)
            .await;

        let resolver = resolver(&server);
        assert!(matches!(
            resolver.resolve(&credential()).await.unwrap_err(),
            DocStoreError::NotFound(_)
        ));
        assert_eq!(resolver.resolve(&credential()).await.unwrap().as_str(), "site-9");
    }

    #[test]
    fn lookup_url_normalizes_site_path() {
        let http = Arc::new(HttpClient::new().unwrap());
        let resolver = SiteResolver::new(
            http,
            "https://graph.example/v1.0/",
            RemoteSiteConfig::new("contoso.sharepoint.com", "sites/HR Portal/"),
        );
        assert_eq!(
            resolver.lookup_url(),
            "https://graph.example/v1.0/sites/contoso.sharepoint.com:/sites/HR%20Portal"
        );
    }
}
