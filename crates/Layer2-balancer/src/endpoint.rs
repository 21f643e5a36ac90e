//! Endpoint, releaser and factory traits
//!
//! ## 구성 요소
//!
//! - `Endpoint`: 논리 호출 하나를 수행 (전송/직렬화는 구현체 책임)
//! - `Releaser`: 인스턴스가 제거될 때 자원 정리 (정확히 한 번)
//! - `Factory`: 인스턴스 ID → (Endpoint, Releaser)

use crate::context::CallContext;
use crate::error::BoxError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// One callable backend binding.
///
/// Implementations must tolerate concurrent calls and a context that the
/// caller stops waiting on without notice.
#[async_trait]
pub trait Endpoint<Req, Resp>: Send + Sync {
    async fn call(&self, ctx: CallContext, request: Req) -> Result<Resp, BoxError>;
}

/// Shared handle to an endpoint, as handed out by publishers and balancers
pub type SharedEndpoint<Req, Resp> = Arc<dyn Endpoint<Req, Resp>>;

/// Adapter returned by [`endpoint_fn`]
#[derive(Clone)]
pub struct EndpointFn<F> {
    f: F,
}

/// Build an endpoint from an async closure.
///
/// ```ignore
/// let echo = endpoint_fn(|_ctx, req: String| async move { Ok::<_, BoxError>(req) });
/// ```
pub fn endpoint_fn<F, Fut, Req, Resp>(f: F) -> EndpointFn<F>
where
    F: Fn(CallContext, Req) -> Fut,
    Fut: Future<Output = Result<Resp, BoxError>>,
{
    EndpointFn { f }
}

#[async_trait]
impl<F, Fut, Req, Resp> Endpoint<Req, Resp> for EndpointFn<F>
where
    F: Fn(CallContext, Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Resp, BoxError>> + Send,
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn call(&self, ctx: CallContext, request: Req) -> Result<Resp, BoxError> {
        (self.f)(ctx, request).await
    }
}

/// Cleanup for a binding's resources, consumed on release
pub trait Releaser: Send {
    fn release(self: Box<Self>) -> Result<(), BoxError>;
}

impl<F> Releaser for F
where
    F: FnOnce() -> Result<(), BoxError> + Send,
{
    fn release(self: Box<Self>) -> Result<(), BoxError> {
        (*self)()
    }
}

/// What a factory produces for one instance
pub type Resolved<Req, Resp> = (SharedEndpoint<Req, Resp>, Option<Box<dyn Releaser>>);

/// Resolves raw instance identifiers into endpoints.
///
/// Called synchronously from reconciliation, never concurrently for the
/// same instance.
pub trait Factory<Req, Resp>: Send + Sync {
    fn create(&self, instance: &str) -> Result<Resolved<Req, Resp>, BoxError>;
}

impl<F, Req, Resp> Factory<Req, Resp> for F
where
    F: Fn(&str) -> Result<Resolved<Req, Resp>, BoxError> + Send + Sync,
{
    fn create(&self, instance: &str) -> Result<Resolved<Req, Resp>, BoxError> {
        self(instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_endpoint_fn() {
        let endpoint: SharedEndpoint<u32, u32> =
            Arc::new(endpoint_fn(|_ctx, n: u32| async move { Ok::<_, BoxError>(n * 2) }));

        let out = endpoint.call(CallContext::background(), 21).await.unwrap();
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn test_endpoint_fn_error() {
        let endpoint = endpoint_fn(|_ctx, _req: ()| async move { Err::<(), BoxError>("refused".into()) });

        let err = endpoint.call(CallContext::background(), ()).await.unwrap_err();
        assert_eq!(err.to_string(), "refused");
    }

    #[test]
    fn test_closure_releaser_runs_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let releaser: Box<dyn Releaser> = Box::new(move || -> Result<(), BoxError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        releaser.release().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closure_factory() {
        let factory = |instance: &str| -> Result<Resolved<(), String>, BoxError> {
            if instance.is_empty() {
                return Err("empty instance".into());
            }
            let name = instance.to_string();
            let endpoint: SharedEndpoint<(), String> = Arc::new(endpoint_fn(move |_ctx, _req: ()| {
                let name = name.clone();
                async move { Ok::<_, BoxError>(name) }
            }));
            Ok((endpoint, None))
        };

        assert!(factory.create("a").is_ok());
        assert!(factory.create("").is_err());
    }
}
