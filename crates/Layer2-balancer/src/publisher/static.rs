//! Static publisher - a fixed publisher populated once from a list

use super::{FixedPublisher, Publisher};
use crate::endpoint::{Factory, SharedEndpoint};
use crate::error::Result;
use std::ops::Deref;

/// Yields the endpoints produced by the factory for a static instance list
pub struct StaticPublisher<Req, Resp> {
    inner: FixedPublisher<Req, Resp>,
}

impl<Req, Resp> StaticPublisher<Req, Resp> {
    pub fn new<S, F>(instances: &[S], factory: F) -> Self
    where
        S: AsRef<str>,
        F: Factory<Req, Resp> + 'static,
    {
        let inner = FixedPublisher::new(factory).with_name("static publisher");
        inner.replace(instances);
        Self { inner }
    }
}

impl<Req, Resp> Deref for StaticPublisher<Req, Resp> {
    type Target = FixedPublisher<Req, Resp>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<Req, Resp> Publisher<Req, Resp> for StaticPublisher<Req, Resp> {
    fn endpoints(&self) -> Result<Vec<SharedEndpoint<Req, Resp>>> {
        self.inner.endpoints()
    }
}
