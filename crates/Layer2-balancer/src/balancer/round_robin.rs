//! Round-robin selection

use super::LoadBalancer;
use crate::endpoint::SharedEndpoint;
use crate::error::{BalancerError, Result};
use crate::publisher::Publisher;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Cycles through the publisher's endpoints.
///
/// The counter is shared by all callers and only ever increases; the index
/// is taken modulo the snapshot length at pick time, so a membership change
/// keeps the cycle position instead of resetting it.
pub struct RoundRobin<Req, Resp> {
    publisher: Arc<dyn Publisher<Req, Resp>>,
    counter: AtomicUsize,
}

impl<Req, Resp> RoundRobin<Req, Resp> {
    pub fn new(publisher: Arc<dyn Publisher<Req, Resp>>) -> Self {
        Self {
            publisher,
            counter: AtomicUsize::new(0),
        }
    }
}

impl<Req, Resp> LoadBalancer<Req, Resp> for RoundRobin<Req, Resp> {
    fn endpoint(&self) -> Result<SharedEndpoint<Req, Resp>> {
        let endpoints = self.publisher.endpoints()?;
        if endpoints.is_empty() {
            return Err(BalancerError::NoEndpoints);
        }

        let idx = self.counter.fetch_add(1, Ordering::Relaxed) % endpoints.len();
        Ok(Arc::clone(&endpoints[idx]))
    }
}
