//! Overlay of several registries, first hit wins

use std::sync::Arc;

use indexmap::IndexMap;

use super::{GatewayFactoryRegistry, GatewayRegistry, Registry, StorageRegistry};
use crate::factory::GatewayFactory;
use crate::gateway::Gateway;
use crate::model::ModelId;
use crate::storage::Storage;
use crate::{Error, Result};

/// Registry querying its sources in order.
///
/// # Routing
///
/// Lookups return the first source's hit; later sources are consulted only
/// on `NotFound`. Other errors propagate immediately. Listings are the union
/// of all sources, and on a name collision the earlier source's entry hides
/// the later one.
pub struct FallbackRegistry {
    sources: Vec<Arc<dyn Registry>>,
}

impl FallbackRegistry {
    /// Overlay `sources`, highest priority first
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn Registry>>) -> Self {
        Self { sources }
    }

    /// Number of sources
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if there are no sources
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn first_hit<T>(
        &self,
        kind: &'static str,
        name: &str,
        lookup: impl Fn(&dyn Registry) -> Result<T>,
    ) -> Result<T> {
        for source in &self.sources {
            match lookup(source.as_ref()) {
                Err(Error::NotFound { .. }) => {}
                found => return found,
            }
        }
        Err(Error::not_found(kind, name))
    }

    fn union<K, V>(&self, list: impl Fn(&dyn Registry) -> IndexMap<K, V>) -> IndexMap<K, V>
    where
        K: std::hash::Hash + Eq,
    {
        let mut out = IndexMap::new();
        for source in &self.sources {
            for (key, value) in list(source.as_ref()) {
                out.entry(key).or_insert(value);
            }
        }
        out
    }
}

impl GatewayRegistry for FallbackRegistry {
    fn gateway(&self, name: &str) -> Result<Arc<dyn Gateway>> {
        self.first_hit("Gateway", name, |r| r.gateway(name))
    }

    fn gateways(&self) -> IndexMap<String, Arc<dyn Gateway>> {
        self.union(|r| r.gateways())
    }
}

impl StorageRegistry for FallbackRegistry {
    fn storage(&self, model: &str) -> Result<Arc<dyn Storage>> {
        self.first_hit("Storage", model, |r| r.storage(model))
    }

    fn storages(&self) -> IndexMap<ModelId, Arc<dyn Storage>> {
        self.union(|r| r.storages())
    }
}

impl GatewayFactoryRegistry for FallbackRegistry {
    fn gateway_factory(&self, name: &str) -> Result<Arc<dyn GatewayFactory>> {
        self.first_hit("Gateway factory", name, |r| r.gateway_factory(name))
    }

    fn gateway_factories(&self) -> IndexMap<String, Arc<dyn GatewayFactory>> {
        self.union(|r| r.gateway_factories())
    }
}
