//! Resilient operation orchestrator
//!
//! Runs a unit of work with a freshly acquired bearer credential, classifying
//! every failure and retrying the retryable ones with exponential backoff.
//! A new credential is requested on every attempt so an expired or revoked
//! token never outlives the attempt that saw it fail.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use docbridge_common::resilience::RetryPolicy;
use docbridge_domain::constants::{DEFAULT_OPERATION_BASE_DELAY_MS, DEFAULT_OPERATION_MAX_RETRIES};
use docbridge_domain::{
    BearerCredential, ErrorClass, OperationError, OperationResult, Result, RetrySettings,
};
use tracing::{error, info, warn};

use crate::ports::TokenSource;

/// Orchestrates credential acquisition and retries around a unit of work
#[derive(Clone)]
pub struct ResilientExecutor {
    tokens: Arc<dyn TokenSource>,
    policy: RetryPolicy,
}

impl ResilientExecutor {
    /// Create an executor with the default policy (3 retries, 1 s base delay)
    pub fn new(tokens: Arc<dyn TokenSource>) -> Self {
        Self::with_policy(
            tokens,
            RetryPolicy::operation(
                DEFAULT_OPERATION_MAX_RETRIES,
                Duration::from_millis(DEFAULT_OPERATION_BASE_DELAY_MS),
            ),
        )
    }

    pub fn with_policy(tokens: Arc<dyn TokenSource>, policy: RetryPolicy) -> Self {
        Self { tokens, policy }
    }

    /// Build the operation policy from loaded retry settings
    pub fn from_settings(tokens: Arc<dyn TokenSource>, settings: &RetrySettings) -> Self {
        Self::with_policy(
            tokens,
            RetryPolicy::operation(
                settings.operation_max_retries,
                Duration::from_millis(settings.operation_base_delay_ms),
            ),
        )
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `unit_of_work` with a fresh credential per attempt.
    ///
    /// Failures from credential acquisition and from the unit of work are
    /// classified the same way. Fatal errors return immediately; retryable
    /// ones are retried until the retry budget is spent. The returned
    /// [`OperationError`] carries the number of retries performed.
    pub async fn with_resilient_token<T, F, Fut>(&self, mut unit_of_work: F) -> OperationResult<T>
    where
        F: FnMut(BearerCredential) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let max_retries = self.policy.max_retries();
        let mut retry = 0u32;

        loop {
            if retry > 0 {
                self.policy.wait_before(retry).await;
            }

            let outcome = match self.tokens.acquire().await {
                Ok(credential) => unit_of_work(credential).await,
                Err(err) => Err(err),
            };

            let err = match outcome {
                Ok(value) => {
                    if retry > 0 {
                        info!(retries = retry, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            match err.classify() {
                ErrorClass::Retryable(reason) if retry < max_retries => {
                    retry += 1;
                    warn!(
                        retry,
                        max_retries,
                        reason = ?reason,
                        error = %err,
                        "Retryable failure, retrying with a fresh credential"
                    );
                }
                ErrorClass::Retryable(_) => {
                    error!(retries = retry, error = %err, "Retries exhausted");
                    return Err(OperationError::new(err, retry));
                }
                ErrorClass::Fatal => {
                    warn!(retries = retry, kind = err.kind(), error = %err, "Fatal failure");
                    return Err(OperationError::new(err, retry));
                }
            }
        }
    }
}
