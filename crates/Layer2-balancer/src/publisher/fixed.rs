//! Fixed publisher - instance registry reconciled through `replace`
//!
//! Clients update the endpoint set by providing the current list of
//! instance strings. New instances are turned into endpoints by the factory,
//! instances present in both the old and new list are left untouched, and
//! instances that disappeared have their releaser invoked.
//!
//! Instance strings are used as keys and are expected to be unique within a
//! single `replace` call.

use super::Publisher;
use crate::endpoint::{Factory, Releaser, SharedEndpoint};
use crate::error::{BalancerError, Result};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A live instance: its endpoint and the cleanup to run when it is removed
struct Binding<Req, Resp> {
    instance: String,
    endpoint: SharedEndpoint<Req, Resp>,
    releaser: Option<Box<dyn Releaser>>,
}

/// Immutable view handed to readers, swapped wholesale on `replace`
struct Published<Req, Resp> {
    instances: Vec<String>,
    endpoints: Vec<SharedEndpoint<Req, Resp>>,
}

impl<Req, Resp> Published<Req, Resp> {
    fn empty() -> Self {
        Self {
            instances: Vec::new(),
            endpoints: Vec::new(),
        }
    }
}

/// Registry of instance bindings with atomic reconciliation
pub struct FixedPublisher<Req, Resp> {
    factory: Box<dyn Factory<Req, Resp>>,

    /// Owned bindings; holding this lock is what serializes `replace`
    bindings: Mutex<Vec<Binding<Req, Resp>>>,

    /// Reader-facing snapshot
    published: RwLock<Arc<Published<Req, Resp>>>,

    /// Component name (for logs)
    name: String,
}

impl<Req, Resp> FixedPublisher<Req, Resp> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Factory<Req, Resp> + 'static,
    {
        Self {
            factory: Box::new(factory),
            bindings: Mutex::new(Vec::new()),
            published: RwLock::new(Arc::new(Published::empty())),
            name: "fixed publisher".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reconcile the live set with `instances`.
    ///
    /// Bindings whose instance is still listed are kept as they are, new
    /// instances go through the factory, and dropped instances are released
    /// once the new set is visible to readers. Instances the factory cannot
    /// resolve are logged and left out; the resulting order follows
    /// `instances` with those gaps closed.
    pub fn replace<S: AsRef<str>>(&self, instances: &[S]) {
        let mut bindings = self.bindings.lock();

        // Resolve new instances before touching the live bindings, so a
        // factory that fails or panics leaves them intact.
        let live: HashSet<String> = bindings.iter().map(|b| b.instance.clone()).collect();
        let mut order: Vec<&str> = Vec::with_capacity(instances.len());
        let mut placed: HashSet<&str> = HashSet::with_capacity(instances.len());
        let mut fresh: HashMap<&str, Binding<Req, Resp>> = HashMap::new();

        for instance in instances {
            let instance = instance.as_ref();
            if !placed.insert(instance) {
                debug!(instance = %instance, "[{}] Duplicate instance ignored", self.name);
                continue;
            }
            order.push(instance);

            if live.contains(instance) {
                continue;
            }
            if let Some(binding) = self.create(instance) {
                fresh.insert(instance, binding);
            }
        }
        let created = fresh.len();

        let mut retained: HashMap<String, Binding<Req, Resp>> = HashMap::new();
        let mut removed = Vec::new();
        for binding in bindings.drain(..) {
            if placed.contains(binding.instance.as_str()) {
                retained.insert(binding.instance.clone(), binding);
            } else {
                removed.push(binding);
            }
        }

        let next: Vec<Binding<Req, Resp>> = order
            .iter()
            .filter_map(|instance| retained.remove(*instance).or_else(|| fresh.remove(instance)))
            .collect();

        let published = Published {
            instances: next.iter().map(|b| b.instance.clone()).collect(),
            endpoints: next.iter().map(|b| Arc::clone(&b.endpoint)).collect(),
        };
        *self.published.write() = Arc::new(published);
        *bindings = next;

        let removed_count = removed.len();
        for binding in removed {
            release_binding(&self.name, binding);
        }

        info!(
            live = bindings.len(),
            created,
            removed = removed_count,
            "[{}] Replaced instance set",
            self.name
        );
    }

    /// Run the factory for one instance. Errors and panics are logged and
    /// yield `None`.
    fn create(&self, instance: &str) -> Option<Binding<Req, Resp>> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.factory.create(instance)))
            .unwrap_or_else(|payload| Err(panic_message(payload.as_ref()).into()));

        match outcome {
            Ok((endpoint, releaser)) => Some(Binding {
                instance: instance.to_string(),
                endpoint,
                releaser,
            }),
            Err(source) => {
                let err = BalancerError::InstanceResolution {
                    instance: instance.to_string(),
                    source,
                };
                warn!(instance = %instance, error = %err, "[{}] Instance excluded", self.name);
                None
            }
        }
    }

    /// Ordered instance ids of the live set.
    pub fn instances(&self) -> Vec<String> {
        self.snapshot().instances.clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Arc<Published<Req, Resp>> {
        Arc::clone(&self.published.read())
    }
}

impl<Req, Resp> Publisher<Req, Resp> for FixedPublisher<Req, Resp> {
    fn endpoints(&self) -> Result<Vec<SharedEndpoint<Req, Resp>>> {
        Ok(self.snapshot().endpoints.clone())
    }
}

impl<Req, Resp> Drop for FixedPublisher<Req, Resp> {
    fn drop(&mut self) {
        for binding in self.bindings.get_mut().drain(..) {
            release_binding(&self.name, binding);
        }
    }
}

/// Run a removed binding's releaser; failures are logged, never propagated.
fn release_binding<Req, Resp>(component: &str, binding: Binding<Req, Resp>) {
    let Binding {
        instance, releaser, ..
    } = binding;

    let Some(releaser) = releaser else {
        debug!(instance = %instance, "[{}] Removed instance without releaser", component);
        return;
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| releaser.release()))
        .unwrap_or_else(|payload| Err(panic_message(payload.as_ref()).into()));

    match outcome {
        Ok(()) => debug!(instance = %instance, "[{}] Released instance", component),
        Err(source) => {
            let err = BalancerError::Release {
                instance: instance.clone(),
                source,
            };
            warn!(instance = %instance, error = %err, "[{}] Release failed", component);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {}", msg)
    } else {
        "panicked".to_string()
    }
}
