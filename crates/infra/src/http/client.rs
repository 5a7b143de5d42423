use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use docbridge_common::resilience::RetryPolicy;
use docbridge_domain::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TRANSPORT_BASE_DELAY_MS, DEFAULT_TRANSPORT_MAX_ATTEMPTS,
};
use docbridge_domain::{DocStoreError, Result, RetrySettings};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use tracing::debug;

use crate::errors::conversions::from_http;

/// `User-Agent` sent by clients built from settings.
pub const USER_AGENT: &str = concat!("docbridge/", env!("CARGO_PKG_VERSION"));

/// HTTP client with built-in retry and timeout support.
///
/// A response is definitive when its status is 2xx or 404; anything else is
/// retried with linear backoff until the attempt budget runs out.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    policy: RetryPolicy,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Client configured from loaded retry settings.
    pub fn from_settings(settings: &RetrySettings) -> Result<Self> {
        Self::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .max_attempts(settings.transport_max_attempts)
            .base_backoff(Duration::from_millis(settings.transport_base_delay_ms))
            .user_agent(USER_AGENT)
            .build()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with retry semantics.
    ///
    /// On exhaustion the last response is returned if any attempt produced
    /// one; otherwise the last transport error is returned unchanged.
    ///
    /// # Errors
    /// `DocStoreError::Internal` if the request cannot be built or its body
    /// cannot be cloned for a retry; `DocStoreError::Transport` if no attempt
    /// produced a response.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build().map_err(from_http)?;
        if request.try_clone().is_none() {
            return Err(DocStoreError::Internal(
                "request body cannot be cloned; buffer the body to enable retries".into(),
            ));
        }

        let method = request.method().clone();
        let url = request.url().clone();
        let client = &self.client;

        retry_until_definitive(
            &self.policy,
            move |attempt| {
                let next = request.try_clone();
                let method = method.clone();
                let url = url.clone();
                async move {
                    let request = next.ok_or_else(|| {
                        DocStoreError::Internal("request body cannot be cloned".into())
                    })?;
                    debug!(attempt, %method, %url, "sending HTTP request");

                    let response = client.execute(request).await.map_err(from_http)?;
                    debug!(attempt, %method, %url, status = %response.status(), "received HTTP response");
                    Ok(response)
                }
            },
            |response: &Response| is_definitive(response.status()),
        )
        .await
    }
}

/// 2xx, or 404 which no retry can fix.
fn is_definitive(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::NOT_FOUND
}

/// Run `attempt` until it yields a definitive value or the policy's attempt
/// budget is spent, sleeping the policy's backoff in between.
///
/// `attempt` receives the 1-based attempt number. Errors and non-definitive
/// values are both retried. On exhaustion the most recent value is returned
/// if any attempt produced one, otherwise the last error.
pub async fn retry_until_definitive<T, E, F, Fut, D>(
    policy: &RetryPolicy,
    mut attempt: F,
    is_definitive: D,
) -> std::result::Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    D: Fn(&T) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_value = None;
    let mut current = 1u32;

    loop {
        let exhausted = current >= max_attempts;

        match attempt(current).await {
            Ok(value) if is_definitive(&value) || exhausted => return Ok(value),
            Ok(value) => {
                debug!(attempt = current, max_attempts, "non-definitive response, retrying");
                last_value = Some(value);
            }
            Err(err) if exhausted => return last_value.map_or(Err(err), Ok),
            Err(err) => {
                debug!(attempt = current, max_attempts, error = %err, "attempt failed, retrying");
            }
        }

        policy.wait_before(current).await;
        current += 1;
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: u32,
    base_backoff: Duration,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_attempts: DEFAULT_TRANSPORT_MAX_ATTEMPTS,
            base_backoff: Duration::from_millis(DEFAULT_TRANSPORT_BASE_DELAY_MS),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|err| DocStoreError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(HttpClient {
            client,
            policy: RetryPolicy::transport(self.max_attempts, self.base_backoff),
        })
    }
}
