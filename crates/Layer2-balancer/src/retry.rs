//! Retry logic bounded by attempts and a single deadline
//!
//! Every logical call gets one deadline computed at the start. Each attempt
//! selects an endpoint and runs it as its own task, racing it against that
//! deadline. An attempt that loses the race is abandoned, not aborted: its
//! context is cancelled and whatever it does afterwards is ignored.

use crate::balancer::LoadBalancer;
use crate::context::CallContext;
use crate::endpoint::Endpoint;
use crate::error::{BalancerError, BoxError, Result};
use async_trait::async_trait;
use dispatch_foundation::RetrySettings;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Budget for the whole logical call
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetrySettings::default().into()
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, timeout: Duration) -> Self {
        Self {
            max_attempts,
            timeout,
        }
    }

    /// A single attempt within `timeout`
    pub fn no_retry(timeout: Duration) -> Self {
        Self::new(1, timeout)
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        Self::new(settings.max_attempts, settings.timeout())
    }
}

/// Wraps a load balancer so each call is retried on a fresh endpoint
pub struct Retry<Req, Resp> {
    balancer: Arc<dyn LoadBalancer<Req, Resp>>,
    policy: RetryPolicy,
}

/// Retry calls through `balancer` at most `max_attempts` times within
/// `timeout`.
pub fn retry<Req, Resp>(
    max_attempts: u32,
    timeout: Duration,
    balancer: Arc<dyn LoadBalancer<Req, Resp>>,
) -> Retry<Req, Resp> {
    Retry::new(balancer, RetryPolicy::new(max_attempts, timeout))
}

impl<Req, Resp> Retry<Req, Resp> {
    pub fn new(balancer: Arc<dyn LoadBalancer<Req, Resp>>, policy: RetryPolicy) -> Self {
        let policy = if policy.max_attempts == 0 {
            debug!("max_attempts of 0 clamped to 1");
            RetryPolicy {
                max_attempts: 1,
                ..policy
            }
        } else {
            policy
        };

        Self { balancer, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

impl<Req, Resp> Retry<Req, Resp>
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
{
    /// Execute one logical call.
    ///
    /// Returns the first successful response. Fails with
    /// `DeadlineExceeded` once the deadline passes (before or during an
    /// attempt), with `Cancelled` if `ctx` is cancelled, and otherwise with
    /// the last attempt's error once the attempt budget is spent.
    pub async fn call(&self, ctx: &CallContext, request: Req) -> Result<Resp> {
        let ctx = ctx.child_with_timeout(self.policy.timeout);
        // abandoned attempts see their context cancelled when we return
        let _cancel = ctx.drop_guard();

        let mut last_error = None;

        for attempt in 1..=self.policy.max_attempts {
            ctx.check()?;

            let endpoint = match self.balancer.endpoint() {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    debug!(attempt, error = %e, "Endpoint selection failed");
                    if !e.is_retryable() {
                        return Err(e);
                    }
                    last_error = Some(e);
                    // selection never awaits; give other tasks a turn
                    tokio::task::yield_now().await;
                    continue;
                }
            };

            let task = tokio::spawn({
                let ctx = ctx.clone();
                let request = request.clone();
                async move { endpoint.call(ctx, request).await }
            });

            tokio::select! {
                biased;
                reason = ctx.done() => {
                    debug!(attempt, error = %reason, "Call abandoned");
                    return Err(reason);
                }
                joined = task => match joined {
                    Ok(Ok(response)) => return Ok(response),
                    Ok(Err(e)) => {
                        let err = BalancerError::endpoint(e);
                        if !err.is_retryable() {
                            debug!(attempt, error = %err, "Attempt failed, not retrying");
                            return Err(err);
                        }
                        warn!(
                            attempt,
                            max_attempts = self.policy.max_attempts,
                            error = %err,
                            "Attempt failed"
                        );
                        last_error = Some(err);
                    }
                    Err(join_error) => {
                        warn!(attempt, error = %join_error, "Attempt panicked");
                        last_error = Some(BalancerError::Panicked(join_error.to_string()));
                    }
                },
            }
        }

        warn!(
            max_attempts = self.policy.max_attempts,
            "Retry budget exhausted"
        );
        Err(last_error.unwrap_or(BalancerError::NoEndpoints))
    }
}

/// A retrying balancer is itself an endpoint, so it can be nested or
/// registered like any other binding.
#[async_trait]
impl<Req, Resp> Endpoint<Req, Resp> for Retry<Req, Resp>
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, ctx: CallContext, request: Req) -> std::result::Result<Resp, BoxError> {
        Retry::call(self, &ctx, request).await.map_err(Into::into)
    }
}
