//! Client-credentials token exchange against the identity provider
//!
//! Every call to [`ClientCredentialsProvider::acquire`] performs a new
//! exchange; nothing is cached between calls.

use std::sync::Arc;

use async_trait::async_trait;
use docbridge_core::ports::TokenSource;
use docbridge_domain::{
    BearerCredential, ClientCredentials, DocStoreError, EndpointConfig, Result,
};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::errors::conversions::from_http;
use crate::http::HttpClient;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    error_description: Option<String>,
}

/// [`TokenSource`] backed by the OAuth2 client-credentials grant
pub struct ClientCredentialsProvider {
    http: Arc<HttpClient>,
    credentials: ClientCredentials,
    token_url: String,
    scope: String,
}

impl ClientCredentialsProvider {
    /// Create a provider, failing fast if any credential is missing.
    ///
    /// # Errors
    /// `DocStoreError::Config` if tenant, client id or secret is blank.
    pub fn new(
        http: Arc<HttpClient>,
        credentials: ClientCredentials,
        endpoints: &EndpointConfig,
    ) -> Result<Self> {
        credentials.validate()?;
        Ok(Self::from_parts(http, credentials, endpoints))
    }

    /// Create a provider without validating; credentials are checked on every
    /// [`acquire`](TokenSource::acquire) instead.
    pub fn from_parts(
        http: Arc<HttpClient>,
        credentials: ClientCredentials,
        endpoints: &EndpointConfig,
    ) -> Self {
        let token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            endpoints.login_base_url.trim_end_matches('/'),
            credentials.tenant_id.trim()
        );
        Self { http, credentials, token_url, scope: endpoints.scope.clone() }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    fn client_id_hint(&self) -> String {
        self.credentials.client_id.chars().take(5).collect()
    }
}

#[async_trait]
impl TokenSource for ClientCredentialsProvider {
    #[instrument(skip(self))]
    async fn acquire(&self) -> Result<BearerCredential> {
        self.credentials.validate()?;

        let client_id_hint = self.client_id_hint();
        debug!(client_id = %client_id_hint, "Requesting access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];
        let response =
            self.http.send(self.http.request(Method::POST, &self.token_url).form(&form)).await?;

        let status = response.status();
        let body = response.text().await.map_err(from_http)?;

        if !status.is_success() {
            let err = token_error(status, &body);
            warn!(client_id = %client_id_hint, %status, error = %err, "Token request failed");
            return Err(err);
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            DocStoreError::MalformedResponse(format!("invalid token response: {e}"))
        })?;
        let access_token = token.access_token.filter(|t| !t.is_empty()).ok_or_else(|| {
            DocStoreError::MalformedResponse("token response has no access_token".to_string())
        })?;

        info!(client_id = %client_id_hint, expires_in = ?token.expires_in, "Access token acquired");
        Ok(BearerCredential::new(access_token, token.expires_in))
    }
}

/// A well-formed OAuth error with a 4xx status is a rejection; server errors,
/// throttling and unparseable bodies may clear up on another attempt.
fn token_error(status: StatusCode, body: &str) -> DocStoreError {
    let parsed = serde_json::from_str::<OAuthErrorBody>(body).ok();
    match parsed {
        Some(oauth)
            if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS =>
        {
            let message = match oauth.error_description {
                Some(description) => format!("{}: {}", oauth.error, description),
                None => oauth.error,
            };
            DocStoreError::auth_rejected(message)
        }
        _ => DocStoreError::auth_unavailable(format!(
            "token endpoint returned {status}: {body}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use docbridge_domain::AuthFailure;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn http() -> Arc<HttpClient> {
        Arc::new(
            HttpClient::builder()
                .base_backoff(Duration::from_millis(1))
                .max_attempts(2)
                .build()
                .unwrap(),
        )
    }

    fn endpoints(server: &MockServer) -> EndpointConfig {
        EndpointConfig { login_base_url: server.uri(), ..EndpointConfig::default() }
    }

    fn credentials() -> ClientCredentials {
        ClientCredentials::new("tenant-1", "client-abcdef", "s3cr3t")
    }

    #[test]
    fn missing_secret_fails_at_construction() {
        let result = ClientCredentialsProvider::new(
            http(),
            ClientCredentials::new("tenant-1", "client", " "),
            &EndpointConfig::default(),
        );
        assert!(matches!(result, Err(DocStoreError::Config(_))));
    }

    #[tokio::test]
    async fn unvalidated_provider_checks_on_acquire() {
        let server = MockServer::start().await;
        let provider = ClientCredentialsProvider::from_parts(
            http(),
            ClientCredentials::new("", "client", "secret"),
            &endpoints(&server),
        );

        let err = provider.acquire().await.unwrap_err();
        assert!(matches!(err, DocStoreError::Config(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn exchanges_client_credentials_for_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client-abcdef"))
            .and(body_string_contains("scope=https%3A%2F%2Fgraph.microsoft.com%2F.default"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "tok-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            ClientCredentialsProvider::new(http(), credentials(), &endpoints(&server)).unwrap();
        let credential = provider.acquire().await.unwrap();

        assert_eq!(credential.access_token(), "tok-1");
        assert_eq!(credential.expires_in(), Some(3599));
    }

    #[tokio::test]
    async fn oauth_error_with_client_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "AADSTS7000215: Invalid client secret provided."
            })))
            .mount(&server)
            .await;

        let provider =
            ClientCredentialsProvider::new(http(), credentials(), &endpoints(&server)).unwrap();

        match provider.acquire().await.unwrap_err() {
            DocStoreError::Auth { kind: AuthFailure::Rejected, message } => {
                assert!(message.starts_with("invalid_client"));
            }
            other => panic!("expected rejected auth, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(2)
            .mount(&server)
            .await;

        let provider =
            ClientCredentialsProvider::new(http(), credentials(), &endpoints(&server)).unwrap();
        let err = provider.acquire().await.unwrap_err();

        assert!(matches!(err, DocStoreError::Auth { kind: AuthFailure::Unavailable, .. }));
        assert!(err.classify().is_retryable());
    }

    #[tokio::test]
    async fn success_without_token_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "expires_in": 10 })),
            )
            .mount(&server)
            .await;

        let provider =
            ClientCredentialsProvider::new(http(), credentials(), &endpoints(&server)).unwrap();

        assert!(matches!(
            provider.acquire().await.unwrap_err(),
            DocStoreError::MalformedResponse(_)
        ));
    }

    #[test]
    fn token_url_uses_tenant() {
        let provider = ClientCredentialsProvider::from_parts(
            http(),
            credentials(),
            &EndpointConfig::default(),
        );
        assert_eq!(
            provider.token_url(),
            "https://login.microsoftonline.com/tenant-1/oauth2/v2.0/token"
        );
    }
}
