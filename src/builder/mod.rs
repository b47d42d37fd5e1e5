//! Incremental configuration of the payment runtime
//!
//! [`PayumBuilder`] accumulates gateways, storages, gateway factories and
//! security services without side effects. [`PayumBuilder::build`] resolves
//! everything in one pass:
//!
//! 1. token storage (mandatory)
//! 2. storages, each wrapped into a storage extension injected into the core config
//! 3. core gateway factory, from the complete core config
//! 4. factory catalog: built-ins, then user factories
//! 5. gateways from configs
//! 6. request verifier, token factory, generic token factory
//! 7. the frozen [`Payum`] runtime
//!
//! Any failure aborts the build; no partial runtime is returned.

mod slot;

pub use slot::{
    Component, CoreGatewayFactoryBuilder, GatewayFactoryBuilder, GenericTokenFactoryBuilder,
    HttpRequestVerifierBuilder, SlotKind, TokenFactoryBuilder, TokenStorageBuilder,
};

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info};

use slot::BuilderSlot;

use crate::extension::StorageExtension;
use crate::factory::{Capabilities, CoreGatewayFactory, GatewayFactory, GatewayFactoryCatalog};
use crate::gateway::{
    FACTORY_KEY, Gateway, GatewayConfig, GatewayFactoryConfig, TOKEN_STORAGE_KEY,
};
use crate::model::{Details, ModelId, Payment, Payout};
use crate::payum::Payum;
use crate::registry::{
    FallbackRegistry, GatewayRegistry, Registry, SimpleRegistry, StorageRegistry,
};
use crate::security::{
    DefaultTokenFactory, GenericTokenFactory, HttpRequestVerifier, PathTokenFactory,
    PlainHttpRequestVerifier, TOKEN_ID_FIELD, Token, TokenFactory, TokenPaths,
};
use crate::storage::{MemoryStorage, Storage};
use crate::{Error, Result};

/// Base URL token URLs are resolved against unless set
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

const MISSING_TOKEN_STORAGE: &str = "Token storage must be configured.";
const MISSING_FACTORY: &str =
    "Gateway config must have factory set in it and it must not be empty.";

/// Models covered by [`PayumBuilder::add_default_storages`]
#[must_use]
pub fn default_storage_models() -> [ModelId; 3] {
    [
        ModelId::of::<Payment>(),
        ModelId::of::<Details>(),
        ModelId::of::<Payout>(),
    ]
}

/// Builder of the [`Payum`] runtime.
///
/// Setters for the same slot replace each other; `add_*_config` calls merge
/// key-by-key with later keys winning. Call order is otherwise irrelevant.
///
/// # Example
///
/// ```rust
/// use payum::builder::PayumBuilder;
/// use payum::gateway::GatewayConfig;
/// use payum::registry::GatewayRegistry;
///
/// let payum = PayumBuilder::new()
///     .add_default_storages()
///     .add_gateway_config("cash", GatewayConfig::new().with("factory", "offline"))
///     .build()
///     .unwrap();
///
/// assert!(payum.gateway("cash").is_ok());
/// ```
#[derive(Default)]
pub struct PayumBuilder {
    gateways: IndexMap<String, Arc<dyn Gateway>>,
    gateway_configs: IndexMap<String, GatewayConfig>,
    storages: IndexMap<ModelId, Arc<dyn Storage>>,
    default_storages: bool,
    gateway_factories: IndexMap<String, BuilderSlot<dyn GatewayFactory, GatewayFactoryBuilder>>,
    gateway_factory_configs: IndexMap<String, GatewayFactoryConfig>,
    core_gateway_factory_config: GatewayConfig,
    token_storage: BuilderSlot<dyn Storage, TokenStorageBuilder>,
    http_request_verifier: BuilderSlot<dyn HttpRequestVerifier, HttpRequestVerifierBuilder>,
    token_factory: BuilderSlot<dyn TokenFactory, TokenFactoryBuilder>,
    generic_token_factory: BuilderSlot<dyn GenericTokenFactory, GenericTokenFactoryBuilder>,
    core_gateway_factory: BuilderSlot<dyn GatewayFactory, CoreGatewayFactoryBuilder>,
    token_paths: TokenPaths,
    base_url: Option<String>,
    capabilities: Capabilities,
    main_registry: Option<Arc<dyn Registry>>,
}

impl PayumBuilder {
    /// Empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Storages
    // ========================================================================

    /// Provide in-memory storages for payments, details and payouts, plus an
    /// in-memory token storage unless one is configured.
    ///
    /// Explicitly added storages for the same models take precedence.
    #[must_use]
    pub fn add_default_storages(mut self) -> Self {
        self.default_storages = true;
        self
    }

    /// Storage for `model`; replaces any earlier storage for it
    #[must_use]
    pub fn add_storage(mut self, model: impl Into<ModelId>, storage: Arc<dyn Storage>) -> Self {
        self.storages.insert(model.into(), storage);
        self
    }

    /// Token storage instance
    #[must_use]
    pub fn set_token_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.token_storage = BuilderSlot::Instance(storage);
        self
    }

    /// Token storage built at build time
    #[must_use]
    pub fn set_token_storage_builder<F>(mut self, builder: F) -> Self
    where
        F: FnOnce() -> Component + Send + 'static,
    {
        self.token_storage = BuilderSlot::Builder(Box::new(builder));
        self
    }

    // ========================================================================
    // Gateways and factories
    // ========================================================================

    /// Ready gateway under `name`
    #[must_use]
    pub fn add_gateway(mut self, name: impl Into<String>, gateway: Arc<dyn Gateway>) -> Self {
        self.gateways.insert(name.into(), gateway);
        self
    }

    /// Gateway built at build time from `config`.
    ///
    /// Repeated calls for a name merge key-by-key. A config takes precedence
    /// over a ready gateway of the same name.
    #[must_use]
    pub fn add_gateway_config(mut self, name: impl Into<String>, config: GatewayConfig) -> Self {
        self.gateway_configs
            .entry(name.into())
            .or_default()
            .merge(&config);
        self
    }

    /// Gateway factory instance; replaces a built-in of the same name
    #[must_use]
    pub fn add_gateway_factory(
        mut self,
        name: impl Into<String>,
        factory: Arc<dyn GatewayFactory>,
    ) -> Self {
        self.gateway_factories
            .insert(name.into(), BuilderSlot::Instance(factory));
        self
    }

    /// Gateway factory built once at build time from its accumulated config
    /// and the core gateway factory; replaces a built-in of the same name
    #[must_use]
    pub fn add_gateway_factory_builder<F>(mut self, name: impl Into<String>, builder: F) -> Self
    where
        F: FnOnce(GatewayConfig, Arc<dyn GatewayFactory>) -> Arc<dyn GatewayFactory>
            + Send
            + 'static,
    {
        self.gateway_factories
            .insert(name.into(), BuilderSlot::Builder(Box::new(builder)));
        self
    }

    /// Baseline config for factory `name`, merged key-by-key
    #[must_use]
    pub fn add_gateway_factory_config(
        mut self,
        name: impl Into<String>,
        config: GatewayFactoryConfig,
    ) -> Self {
        self.gateway_factory_configs
            .entry(name.into())
            .or_default()
            .merge(&config);
        self
    }

    /// Merge into the core gateway factory config
    #[must_use]
    pub fn add_core_gateway_factory_config(mut self, config: GatewayConfig) -> Self {
        self.core_gateway_factory_config.merge(&config);
        self
    }

    /// Replace the core gateway factory config
    #[must_use]
    pub fn set_core_gateway_factory_config(mut self, config: GatewayConfig) -> Self {
        self.core_gateway_factory_config = config;
        self
    }

    /// Core gateway factory instance
    #[must_use]
    pub fn set_core_gateway_factory(mut self, factory: Arc<dyn GatewayFactory>) -> Self {
        self.core_gateway_factory = BuilderSlot::Instance(factory);
        self
    }

    /// Core gateway factory built from the accumulated core config
    #[must_use]
    pub fn set_core_gateway_factory_builder<F>(mut self, builder: F) -> Self
    where
        F: FnOnce(GatewayConfig) -> Component + Send + 'static,
    {
        self.core_gateway_factory = BuilderSlot::Builder(Box::new(builder));
        self
    }

    /// Optional capabilities of the environment
    #[must_use]
    pub fn set_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Registry consulted before the locally configured collaborators
    #[must_use]
    pub fn set_main_registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.main_registry = Some(registry);
        self
    }

    // ========================================================================
    // Security
    // ========================================================================

    /// Request verifier instance
    #[must_use]
    pub fn set_http_request_verifier(mut self, verifier: Arc<dyn HttpRequestVerifier>) -> Self {
        self.http_request_verifier = BuilderSlot::Instance(verifier);
        self
    }

    /// Request verifier built from the token storage
    #[must_use]
    pub fn set_http_request_verifier_builder<F>(mut self, builder: F) -> Self
    where
        F: FnOnce(Arc<dyn Storage>) -> Component + Send + 'static,
    {
        self.http_request_verifier = BuilderSlot::Builder(Box::new(builder));
        self
    }

    /// Token factory instance
    #[must_use]
    pub fn set_token_factory(mut self, factory: Arc<dyn TokenFactory>) -> Self {
        self.token_factory = BuilderSlot::Instance(factory);
        self
    }

    /// Token factory built from the token storage and the storage registry
    #[must_use]
    pub fn set_token_factory_builder<F>(mut self, builder: F) -> Self
    where
        F: FnOnce(Arc<dyn Storage>, Arc<dyn StorageRegistry>) -> Component + Send + 'static,
    {
        self.token_factory = BuilderSlot::Builder(Box::new(builder));
        self
    }

    /// Generic token factory instance
    #[must_use]
    pub fn set_generic_token_factory(mut self, factory: Arc<dyn GenericTokenFactory>) -> Self {
        self.generic_token_factory = BuilderSlot::Instance(factory);
        self
    }

    /// Generic token factory built from the token factory and the path table
    #[must_use]
    pub fn set_generic_token_factory_builder<F>(mut self, builder: F) -> Self
    where
        F: FnOnce(Arc<dyn TokenFactory>, TokenPaths) -> Component + Send + 'static,
    {
        self.generic_token_factory = BuilderSlot::Builder(Box::new(builder));
        self
    }

    /// Override action → path entries of the generic token factory
    #[must_use]
    pub fn set_generic_token_factory_paths(mut self, paths: IndexMap<String, String>) -> Self {
        self.token_paths.extend(paths);
        self
    }

    /// Base URL of the default token factory
    #[must_use]
    pub fn set_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Accumulated gateway configs
    #[must_use]
    pub fn gateway_configs(&self) -> &IndexMap<String, GatewayConfig> {
        &self.gateway_configs
    }

    /// Accumulated gateway factory configs
    #[must_use]
    pub fn gateway_factory_configs(&self) -> &IndexMap<String, GatewayFactoryConfig> {
        &self.gateway_factory_configs
    }

    /// Accumulated core gateway factory config
    #[must_use]
    pub fn core_gateway_factory_config(&self) -> &GatewayConfig {
        &self.core_gateway_factory_config
    }

    /// Path table the default generic token factory will use
    #[must_use]
    pub fn token_paths(&self) -> &TokenPaths {
        &self.token_paths
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Resolve everything into the runtime.
    ///
    /// # Errors
    ///
    /// - `Error::MissingRequiredDependency` if no token storage can be resolved
    /// - `Error::InvalidBuilderResult` if a builder closure returns the wrong component
    /// - `Error::InvalidGatewayConfig` if a gateway config lacks a `factory`
    /// - `Error::NotFound` if a gateway config names an unknown factory
    /// - `Error::Config` if two storages map to the same extension key
    /// - any error a gateway factory fails with
    pub fn build(mut self) -> Result<Payum> {
        let token_storage = self.resolve_token_storage()?;

        let storages = self.resolve_storages();
        let core_config = self.core_config(&token_storage, &storages)?;
        debug!(
            storages = storages.len(),
            core_keys = core_config.len(),
            "Storages resolved"
        );

        let core = self.core_gateway_factory.resolve(
            |build| build(core_config.clone()).into_gateway_factory(SlotKind::CoreGatewayFactory),
            || {
                let core = CoreGatewayFactory::new(core_config.clone());
                Ok(Arc::new(core) as Arc<dyn GatewayFactory>)
            },
        )?;

        let mut catalog =
            GatewayFactoryCatalog::builtin(&core, &self.gateway_factory_configs, self.capabilities);
        for (name, factory) in self.gateway_factories {
            let factory = factory.resolve(
                |build| {
                    let config = self
                        .gateway_factory_configs
                        .get(&name)
                        .cloned()
                        .unwrap_or_default();
                    Ok(build(config, Arc::clone(&core)))
                },
                || Err(Error::not_found("Gateway factory", name.as_str())),
            )?;
            debug!(factory = %name, "User gateway factory registered");
            catalog.insert(name, factory);
        }

        let mut gateways = self.gateways;
        for (name, config) in self.gateway_configs {
            let gateway = create_gateway(
                &name,
                config,
                &catalog,
                &self.gateway_factory_configs,
                self.main_registry.as_deref(),
            )?;
            gateways.insert(name, gateway);
        }

        let local = Arc::new(SimpleRegistry::new(gateways, storages, catalog));
        let registry: Arc<dyn Registry> = match self.main_registry {
            Some(main) => Arc::new(FallbackRegistry::new(vec![
                main,
                Arc::clone(&local) as Arc<dyn Registry>,
            ])),
            None => Arc::clone(&local) as Arc<dyn Registry>,
        };

        let http_request_verifier = self.http_request_verifier.resolve(
            |build| {
                build(Arc::clone(&token_storage))
                    .into_http_request_verifier(SlotKind::HttpRequestVerifier)
            },
            || {
                let verifier = PlainHttpRequestVerifier::new(Arc::clone(&token_storage));
                Ok(Arc::new(verifier) as Arc<dyn HttpRequestVerifier>)
            },
        )?;

        let token_factory = self.token_factory.resolve(
            |build| {
                let storages = Arc::clone(&registry) as Arc<dyn StorageRegistry>;
                build(Arc::clone(&token_storage), storages)
                    .into_token_factory(SlotKind::TokenFactory)
            },
            || {
                let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
                let factory = DefaultTokenFactory::new(
                    Arc::clone(&token_storage),
                    Arc::clone(&registry) as Arc<dyn StorageRegistry>,
                    base_url,
                )?;
                Ok(Arc::new(factory) as Arc<dyn TokenFactory>)
            },
        )?;

        let token_paths = self.token_paths;
        let generic_token_factory = self.generic_token_factory.resolve(
            |build| {
                build(Arc::clone(&token_factory), token_paths.clone())
                    .into_generic_token_factory(SlotKind::GenericTokenFactory)
            },
            || {
                let factory = PathTokenFactory::new(Arc::clone(&token_factory), token_paths.clone());
                Ok(Arc::new(factory) as Arc<dyn GenericTokenFactory>)
            },
        )?;

        let payum = Payum::new(
            registry,
            local,
            core,
            token_storage,
            http_request_verifier,
            token_factory,
            generic_token_factory,
        );
        info!(
            gateways = payum.gateways().len(),
            storages = payum.storages().len(),
            "Payum built"
        );
        Ok(payum)
    }

    fn resolve_token_storage(&mut self) -> Result<Arc<dyn Storage>> {
        let slot = std::mem::take(&mut self.token_storage);
        let registered = self.storages.get(Token::model_id().as_str()).cloned();
        let default_storages = self.default_storages;
        slot.resolve(
            |build| build().into_storage(SlotKind::TokenStorage),
            || {
                if let Some(storage) = registered {
                    return Ok(storage);
                }
                if default_storages {
                    debug!("Using in-memory token storage");
                    let storage = MemoryStorage::with_id_field(Token::model_id(), TOKEN_ID_FIELD);
                    return Ok(Arc::new(storage) as Arc<dyn Storage>);
                }
                Err(Error::MissingRequiredDependency(
                    MISSING_TOKEN_STORAGE.to_string(),
                ))
            },
        )
    }

    fn resolve_storages(&mut self) -> IndexMap<ModelId, Arc<dyn Storage>> {
        let mut storages: IndexMap<ModelId, Arc<dyn Storage>> = IndexMap::new();
        if self.default_storages {
            for model in default_storage_models() {
                if !self.storages.contains_key(&model) {
                    let storage = Arc::new(MemoryStorage::new(model.clone()));
                    storages.insert(model, storage);
                }
            }
        }
        storages.extend(std::mem::take(&mut self.storages));
        storages
    }

    fn core_config(
        &self,
        token_storage: &Arc<dyn Storage>,
        storages: &IndexMap<ModelId, Arc<dyn Storage>>,
    ) -> Result<GatewayConfig> {
        let mut config = self.core_gateway_factory_config.clone();
        config.insert(TOKEN_STORAGE_KEY, Arc::clone(token_storage));
        let mut owners: IndexMap<String, &ModelId> = IndexMap::new();
        for (model, storage) in storages {
            let key = model.storage_extension_key();
            if let Some(owner) = owners.insert(key.clone(), model) {
                return Err(Error::Config(format!(
                    "Storages for {owner} and {model} map to the same extension key {key}"
                )));
            }
            let extension = Arc::new(StorageExtension::new(Arc::clone(storage)));
            config.insert(key, extension);
        }
        Ok(config)
    }
}

fn create_gateway(
    name: &str,
    mut config: GatewayConfig,
    catalog: &GatewayFactoryCatalog,
    factory_configs: &IndexMap<String, GatewayFactoryConfig>,
    main_registry: Option<&dyn Registry>,
) -> Result<Arc<dyn Gateway>> {
    let factory_name = match config.get_str(FACTORY_KEY) {
        Some(factory) if !factory.is_empty() => factory.to_string(),
        _ => {
            return Err(Error::InvalidGatewayConfig {
                gateway: name.to_string(),
                reason: MISSING_FACTORY.to_string(),
            });
        }
    };

    config.remove(FACTORY_KEY);

    // Same precedence as the final registry: main first, local catalog second
    let from_main = match main_registry.map(|main| main.gateway_factory(&factory_name)) {
        Some(Ok(factory)) => Some(factory),
        Some(Err(Error::NotFound { .. })) | None => None,
        Some(Err(e)) => return Err(e),
    };
    let factory = match from_main.or_else(|| catalog.get(&factory_name)) {
        Some(factory) => factory,
        None => return Err(Error::not_found("Gateway factory", factory_name)),
    };

    if let Some(factory_config) = factory_configs.get(&factory_name) {
        config.defaults(factory_config);
    }
    debug!(gateway = %name, factory = %factory_name, "Creating gateway from config");
    factory.create(config)
}
