//! Dispatcher - config-driven wiring of publisher, balancer and retry
//!
//! The Dispatcher owns one instance registry, the balancer picked by the
//! configured strategy and the retry policy wrapped around it. Discovery
//! code feeds it instance lists, callers send requests through it.

use crate::balancer::{self, LoadBalancer};
use crate::context::CallContext;
use crate::endpoint::{Factory, SharedEndpoint};
use crate::error::Result;
use crate::publisher::{FixedPublisher, Publisher};
use crate::retry::{Retry, RetryPolicy};
use dispatch_foundation::{DispatchConfig, StrategyConfig};
use std::sync::Arc;
use tracing::info;

/// Registry + strategy + retry, built from a `DispatchConfig`
pub struct Dispatcher<Req, Resp> {
    publisher: Arc<FixedPublisher<Req, Resp>>,
    balancer: Arc<dyn LoadBalancer<Req, Resp>>,
    retry: Retry<Req, Resp>,
    strategy: StrategyConfig,
}

impl<Req, Resp> Dispatcher<Req, Resp>
where
    Req: 'static,
    Resp: 'static,
{
    /// Create a dispatcher from config, populating the registry with the
    /// configured instances.
    pub fn from_config<F>(config: &DispatchConfig, factory: F) -> dispatch_foundation::Result<Self>
    where
        F: Factory<Req, Resp> + 'static,
    {
        config.validate()?;

        let publisher = Arc::new(FixedPublisher::new(factory).with_name("dispatcher"));
        publisher.replace(&config.instances);

        let balancer = balancer::from_strategy(config.strategy, publisher.clone());
        let retry = Retry::new(Arc::clone(&balancer), RetryPolicy::from(config.retry));

        info!(
            strategy = config.strategy.name(),
            instances = publisher.len(),
            max_attempts = config.retry.max_attempts,
            timeout_ms = config.retry.timeout_ms,
            "Dispatcher ready"
        );

        Ok(Self {
            publisher,
            balancer,
            retry,
            strategy: config.strategy,
        })
    }

    /// Reconcile the live instance set (see [`FixedPublisher::replace`]).
    pub fn replace<S: AsRef<str>>(&self, instances: &[S]) {
        self.publisher.replace(instances);
    }

    pub fn publisher(&self) -> &Arc<FixedPublisher<Req, Resp>> {
        &self.publisher
    }

    /// Current live endpoints
    pub fn endpoints(&self) -> Result<Vec<SharedEndpoint<Req, Resp>>> {
        self.publisher.endpoints()
    }

    /// Pick one endpoint without retrying
    pub fn endpoint(&self) -> Result<SharedEndpoint<Req, Resp>> {
        self.balancer.endpoint()
    }

    pub fn strategy(&self) -> StrategyConfig {
        self.strategy
    }

    pub fn policy(&self) -> RetryPolicy {
        self.retry.policy()
    }
}

impl<Req, Resp> Dispatcher<Req, Resp>
where
    Req: Clone + Send + 'static,
    Resp: Send + 'static,
{
    /// Send a request through the retrying balancer
    pub async fn call(&self, ctx: &CallContext, request: Req) -> Result<Resp> {
        self.retry.call(ctx, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{endpoint_fn, Resolved};
    use crate::error::{BalancerError, BoxError};
    use std::time::Duration;

    fn echo_factory(instance: &str) -> std::result::Result<Resolved<String, String>, BoxError> {
        if instance.starts_with("bad") {
            return Err("unresolvable".into());
        }
        let name = instance.to_string();
        let endpoint: SharedEndpoint<String, String> =
            Arc::new(endpoint_fn(move |_ctx: CallContext, req: String| {
                let name = name.clone();
                async move { Ok::<_, BoxError>(format!("{}:{}", name, req)) }
            }));
        Ok((endpoint, None))
    }

    #[tokio::test]
    async fn test_from_config_round_robin() {
        let config = DispatchConfig::new().instances(["a", "bad", "b"]);
        let dispatcher = Dispatcher::from_config(&config, echo_factory).unwrap();

        assert_eq!(dispatcher.publisher().instances(), vec!["a", "b"]);
        assert_eq!(dispatcher.strategy(), StrategyConfig::RoundRobin);

        let ctx = CallContext::background();
        assert_eq!(dispatcher.call(&ctx, "ping".into()).await.unwrap(), "a:ping");
        assert_eq!(dispatcher.call(&ctx, "ping".into()).await.unwrap(), "b:ping");
    }

    #[tokio::test]
    async fn test_replace_through_dispatcher() {
        let config = DispatchConfig::new()
            .instances(["a"])
            .strategy(StrategyConfig::Random { seed: Some(1) });
        let dispatcher = Dispatcher::from_config(&config, echo_factory).unwrap();

        dispatcher.replace(&["z"]);
        assert_eq!(dispatcher.endpoints().unwrap().len(), 1);

        let reply = dispatcher
            .call(&CallContext::background(), "x".into())
            .await
            .unwrap();
        assert_eq!(reply, "z:x");
    }

    #[tokio::test]
    async fn test_empty_dispatcher_fails_fast() {
        let config = DispatchConfig::new().max_attempts(5);
        let dispatcher = Dispatcher::from_config(&config, echo_factory).unwrap();

        assert!(matches!(dispatcher.endpoint(), Err(BalancerError::NoEndpoints)));
        let err = dispatcher
            .call(&CallContext::background(), "x".into())
            .await
            .unwrap_err();
        assert!(matches!(err, BalancerError::NoEndpoints));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DispatchConfig::new().max_attempts(0);
        let result = Dispatcher::from_config(&config, echo_factory);
        assert!(matches!(result, Err(dispatch_foundation::Error::Config(_))));
    }

    #[test]
    fn test_policy_from_config() {
        let config = DispatchConfig::new()
            .max_attempts(4)
            .timeout(Duration::from_millis(75));
        let dispatcher = Dispatcher::from_config(&config, echo_factory).unwrap();
        assert_eq!(dispatcher.policy(), RetryPolicy::new(4, Duration::from_millis(75)));
    }
}
