//! # dispatch-balancer
//!
//! Client-side request dispatch for Dispatch.
//! Sits between service discovery (instance ids) and the transport
//! (endpoint implementations).
//!
//! ## Features
//! - Instance registry reconciled atomically from discovery updates
//! - Round-robin and seeded random endpoint selection
//! - Retry bounded by attempt count and a single call deadline
//! - Cooperative cancellation through `CallContext`

pub mod balancer;
pub mod context;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod publisher;
pub mod retry;

// Core traits and types
pub use context::CallContext;
pub use endpoint::{endpoint_fn, Endpoint, EndpointFn, Factory, Releaser, Resolved, SharedEndpoint};
pub use publisher::{FixedPublisher, Publisher, StaticPublisher};

// Selection
pub use balancer::{from_strategy, LoadBalancer, Random, RoundRobin};

// Error and retry
pub use error::{BalancerError, BoxError};
pub use retry::{retry, Retry, RetryPolicy};

// Wiring
pub use dispatcher::Dispatcher;
