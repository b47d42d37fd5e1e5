//! The assembled payment runtime

use std::sync::Arc;

use indexmap::IndexMap;

use crate::Result;
use crate::factory::{GatewayFactory, GatewayFactoryCatalog};
use crate::gateway::Gateway;
use crate::model::ModelId;
use crate::registry::{
    GatewayFactoryRegistry, GatewayRegistry, Registry, SimpleRegistry, StorageRegistry,
};
use crate::security::{GenericTokenFactory, HttpRequestVerifier, TokenFactory};
use crate::storage::Storage;

/// Immutable runtime produced by [`PayumBuilder::build`](crate::builder::PayumBuilder::build).
///
/// Lookups go through the resolved registry: the main registry first when
/// one was set, then the locally configured collaborators. Safe to share
/// across tasks.
pub struct Payum {
    registry: Arc<dyn Registry>,
    local: Arc<SimpleRegistry>,
    core_gateway_factory: Arc<dyn GatewayFactory>,
    token_storage: Arc<dyn Storage>,
    http_request_verifier: Arc<dyn HttpRequestVerifier>,
    token_factory: Arc<dyn TokenFactory>,
    generic_token_factory: Arc<dyn GenericTokenFactory>,
}

impl Payum {
    pub(crate) fn new(
        registry: Arc<dyn Registry>,
        local: Arc<SimpleRegistry>,
        core_gateway_factory: Arc<dyn GatewayFactory>,
        token_storage: Arc<dyn Storage>,
        http_request_verifier: Arc<dyn HttpRequestVerifier>,
        token_factory: Arc<dyn TokenFactory>,
        generic_token_factory: Arc<dyn GenericTokenFactory>,
    ) -> Self {
        Self {
            registry,
            local,
            core_gateway_factory,
            token_storage,
            http_request_verifier,
            token_factory,
            generic_token_factory,
        }
    }

    /// Resolved registry
    #[must_use]
    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }

    /// Factory catalog of the locally configured factories
    #[must_use]
    pub fn catalog(&self) -> &GatewayFactoryCatalog {
        self.local.catalog()
    }

    /// Core gateway factory every built-in factory delegates to
    #[must_use]
    pub fn core_gateway_factory(&self) -> &Arc<dyn GatewayFactory> {
        &self.core_gateway_factory
    }

    /// Token storage
    #[must_use]
    pub fn token_storage(&self) -> &Arc<dyn Storage> {
        &self.token_storage
    }

    /// Request verifier
    #[must_use]
    pub fn http_request_verifier(&self) -> &Arc<dyn HttpRequestVerifier> {
        &self.http_request_verifier
    }

    /// Token factory
    #[must_use]
    pub fn token_factory(&self) -> &Arc<dyn TokenFactory> {
        &self.token_factory
    }

    /// Generic token factory
    #[must_use]
    pub fn generic_token_factory(&self) -> &Arc<dyn GenericTokenFactory> {
        &self.generic_token_factory
    }
}

impl GatewayRegistry for Payum {
    fn gateway(&self, name: &str) -> Result<Arc<dyn Gateway>> {
        self.registry.gateway(name)
    }

    fn gateways(&self) -> IndexMap<String, Arc<dyn Gateway>> {
        self.registry.gateways()
    }
}

impl StorageRegistry for Payum {
    fn storage(&self, model: &str) -> Result<Arc<dyn Storage>> {
        self.registry.storage(model)
    }

    fn storages(&self) -> IndexMap<ModelId, Arc<dyn Storage>> {
        self.registry.storages()
    }
}

impl GatewayFactoryRegistry for Payum {
    fn gateway_factory(&self, name: &str) -> Result<Arc<dyn GatewayFactory>> {
        self.registry.gateway_factory(name)
    }

    fn gateway_factories(&self) -> IndexMap<String, Arc<dyn GatewayFactory>> {
        self.registry.gateway_factories()
    }
}
