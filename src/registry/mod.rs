//! Name-based lookup of gateways, storages and gateway factories
//!
//! [`SimpleRegistry`] holds the builder's locally configured collaborators.
//! [`FallbackRegistry`] overlays several registries, querying them in order.

mod fallback;

pub use fallback::FallbackRegistry;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::factory::{GatewayFactory, GatewayFactoryCatalog};
use crate::gateway::Gateway;
use crate::model::ModelId;
use crate::storage::Storage;
use crate::{Error, Result};

/// Lookup of gateways by name
pub trait GatewayRegistry: Send + Sync {
    /// Gateway registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no gateway has that name.
    fn gateway(&self, name: &str) -> Result<Arc<dyn Gateway>>;

    /// All gateways by name
    fn gateways(&self) -> IndexMap<String, Arc<dyn Gateway>>;
}

/// Lookup of storages by domain model
pub trait StorageRegistry: Send + Sync {
    /// Storage persisting `model`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no storage handles the model.
    fn storage(&self, model: &str) -> Result<Arc<dyn Storage>>;

    /// All storages by model
    fn storages(&self) -> IndexMap<ModelId, Arc<dyn Storage>>;
}

/// Lookup of gateway factories by name
pub trait GatewayFactoryRegistry: Send + Sync {
    /// Factory registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no factory has that name.
    fn gateway_factory(&self, name: &str) -> Result<Arc<dyn GatewayFactory>>;

    /// All factories by name
    fn gateway_factories(&self) -> IndexMap<String, Arc<dyn GatewayFactory>>;
}

/// Full registry: gateways, storages and factories
pub trait Registry: GatewayRegistry + StorageRegistry + GatewayFactoryRegistry {}

impl<T: GatewayRegistry + StorageRegistry + GatewayFactoryRegistry + ?Sized> Registry for T {}

// ============================================================================
// SimpleRegistry
// ============================================================================

/// Registry over in-memory maps
#[derive(Default)]
pub struct SimpleRegistry {
    gateways: IndexMap<String, Arc<dyn Gateway>>,
    storages: IndexMap<ModelId, Arc<dyn Storage>>,
    factories: GatewayFactoryCatalog,
}

impl SimpleRegistry {
    /// Registry over the given collaborators
    #[must_use]
    pub fn new(
        gateways: IndexMap<String, Arc<dyn Gateway>>,
        storages: IndexMap<ModelId, Arc<dyn Storage>>,
        factories: GatewayFactoryCatalog,
    ) -> Self {
        Self {
            gateways,
            storages,
            factories,
        }
    }

    /// Factory catalog backing [`GatewayFactoryRegistry`]
    #[must_use]
    pub fn catalog(&self) -> &GatewayFactoryCatalog {
        &self.factories
    }
}

impl GatewayRegistry for SimpleRegistry {
    fn gateway(&self, name: &str) -> Result<Arc<dyn Gateway>> {
        self.gateways
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found("Gateway", name))
    }

    fn gateways(&self) -> IndexMap<String, Arc<dyn Gateway>> {
        self.gateways.clone()
    }
}

impl StorageRegistry for SimpleRegistry {
    fn storage(&self, model: &str) -> Result<Arc<dyn Storage>> {
        self.storages
            .get(model)
            .cloned()
            .ok_or_else(|| Error::not_found("Storage", model))
    }

    fn storages(&self) -> IndexMap<ModelId, Arc<dyn Storage>> {
        self.storages.clone()
    }
}

impl GatewayFactoryRegistry for SimpleRegistry {
    fn gateway_factory(&self, name: &str) -> Result<Arc<dyn GatewayFactory>> {
        self.factories.gateway_factory(name)
    }

    fn gateway_factories(&self) -> IndexMap<String, Arc<dyn GatewayFactory>> {
        self.factories.gateway_factories()
    }
}
