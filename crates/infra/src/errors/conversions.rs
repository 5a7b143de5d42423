//! Conversions from external infrastructure errors into domain errors.

use docbridge_domain::{DocStoreError, TransportError};
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DocStoreError);

impl From<InfraError> for DocStoreError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DocStoreError> for InfraError {
    fn from(value: DocStoreError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoDocStoreError {
    fn into_docstore(self) -> DocStoreError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → DocStoreError */
/* -------------------------------------------------------------------------- */

impl IntoDocStoreError for HttpError {
    fn into_docstore(self) -> DocStoreError {
        // An invalid URL or header never reaches the network
        if self.is_builder() {
            return DocStoreError::Internal(format!("invalid HTTP request: {self}"));
        }

        if self.is_timeout() {
            return TransportError::Timeout(self.to_string()).into();
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return TransportError::Connection(self.to_string()).into();
        }

        if self.is_decode() {
            return DocStoreError::MalformedResponse(self.to_string());
        }

        TransportError::Request(self.to_string()).into()
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_docstore())
    }
}

/// Shorthand used at call sites that work with `DocStoreError` directly.
pub(crate) fn from_http(err: HttpError) -> DocStoreError {
    InfraError::from(err).into()
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::time::Duration;

    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn slow_response_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client =
            Client::builder().timeout(Duration::from_millis(50)).no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap_err();

        let mapped: DocStoreError = InfraError::from(error).into();
        assert!(
            matches!(mapped, DocStoreError::Transport(TransportError::Timeout(_))),
            "expected timeout, got {mapped:?}"
        );
    }

    #[tokio::test]
    async fn refused_connection_maps_to_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped = from_http(error);
        assert!(
            matches!(mapped, DocStoreError::Transport(TransportError::Connection(_))),
            "expected connection error, got {mapped:?}"
        );
        assert!(mapped.classify().is_retryable());
    }

    #[test]
    fn invalid_url_maps_to_internal_error() {
        let client = Client::new();
        let error = client.get("not a url").build().unwrap_err();

        match from_http(error) {
            DocStoreError::Internal(msg) => assert!(msg.contains("invalid HTTP request")),
            other => panic!("expected internal error, got {other:?}"),
        }
    }
}
