//! Uniform random selection

use super::LoadBalancer;
use crate::endpoint::SharedEndpoint;
use crate::error::{BalancerError, Result};
use crate::publisher::Publisher;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Picks a uniformly random endpoint from each snapshot.
///
/// The generator is owned by the balancer and seeded at construction so a
/// given seed replays the same sequence of picks.
pub struct Random<Req, Resp> {
    publisher: Arc<dyn Publisher<Req, Resp>>,
    rng: Mutex<StdRng>,
}

impl<Req, Resp> Random<Req, Resp> {
    pub fn new(publisher: Arc<dyn Publisher<Req, Resp>>, seed: u64) -> Self {
        Self {
            publisher,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy(publisher: Arc<dyn Publisher<Req, Resp>>) -> Self {
        Self {
            publisher,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl<Req, Resp> LoadBalancer<Req, Resp> for Random<Req, Resp> {
    fn endpoint(&self) -> Result<SharedEndpoint<Req, Resp>> {
        let endpoints = self.publisher.endpoints()?;
        if endpoints.is_empty() {
            return Err(BalancerError::NoEndpoints);
        }

        let idx = self.rng.lock().gen_range(0..endpoints.len());
        Ok(Arc::clone(&endpoints[idx]))
    }
}
