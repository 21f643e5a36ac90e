//! Load balancing strategies
//!
//! A balancer picks one endpoint per request from a fresh publisher
//! snapshot. Neither strategy owns bindings.

pub mod random;
pub mod round_robin;

use crate::endpoint::SharedEndpoint;
use crate::error::Result;
use crate::publisher::Publisher;
use dispatch_foundation::StrategyConfig;
use std::sync::Arc;

pub use random::Random;
pub use round_robin::RoundRobin;

/// Yields one endpoint per request, `NoEndpoints` when the set is empty
pub trait LoadBalancer<Req, Resp>: Send + Sync {
    fn endpoint(&self) -> Result<SharedEndpoint<Req, Resp>>;
}

/// Build the balancer described by a strategy config
pub fn from_strategy<Req, Resp>(
    strategy: StrategyConfig,
    publisher: Arc<dyn Publisher<Req, Resp>>,
) -> Arc<dyn LoadBalancer<Req, Resp>>
where
    Req: 'static,
    Resp: 'static,
{
    match strategy {
        StrategyConfig::RoundRobin => Arc::new(RoundRobin::new(publisher)),
        StrategyConfig::Random { seed: Some(seed) } => Arc::new(Random::new(publisher, seed)),
        StrategyConfig::Random { seed: None } => Arc::new(Random::from_entropy(publisher)),
    }
}
