//! Gateway factories: named constructors turning a config into a gateway
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐  lazily instantiates   ┌──────────────────────────┐
//! │ GatewayFactoryCatalog│───────────────────────▶│ ProviderGatewayFactory   │
//! │ (name → entry)       │                        │ (provider spec + config) │
//! └──────────────────────┘                        └────────────┬─────────────┘
//!                                                              │ delegates
//!                                                              ▼
//!                                                 ┌──────────────────────────┐
//!                                                 │ CoreGatewayFactory       │
//!                                                 │ (storage extensions,     │
//!                                                 │  token storage, core cfg)│
//!                                                 └──────────────────────────┘
//! ```

mod catalog;
mod offline;
mod provider;

pub use catalog::{BUILTIN_FACTORIES, Capabilities, GatewayFactoryCatalog};
pub use offline::{FIELD_PAID, FIELD_STATUS};
pub use provider::{OptionDefault, ProviderGatewayFactory, ProviderSpec};

use std::sync::Arc;

use crate::Result;
use crate::gateway::{
    CoreGateway, DEFAULT_OPTIONS_KEY, FACTORY_NAME_KEY, FACTORY_TITLE_KEY, Gateway,
    GatewayConfig, REQUIRED_OPTIONS_KEY,
};

/// Turns a configuration mapping into a gateway.
pub trait GatewayFactory: Send + Sync + 'static {
    /// Fully defaulted config for `config`: the caller's keys win, the
    /// factory fills everything else.
    fn create_config(&self, config: GatewayConfig) -> Result<GatewayConfig>;

    /// Build a gateway from `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidGatewayOptions` if provider options the
    /// factory requires are missing.
    fn create(&self, config: GatewayConfig) -> Result<Arc<dyn Gateway>>;
}

// ============================================================================
// CoreGatewayFactory
// ============================================================================

/// The factory every provider factory delegates to.
///
/// Its default config is the builder's accumulated core config: explicit
/// core entries, the token storage and one storage extension per storage.
/// Every gateway it creates therefore carries those collaborators.
pub struct CoreGatewayFactory {
    default_config: GatewayConfig,
}

impl CoreGatewayFactory {
    /// Core factory with the given baseline config
    #[must_use]
    pub fn new(default_config: GatewayConfig) -> Self {
        Self { default_config }
    }

    /// Baseline config handed in at construction
    #[must_use]
    pub fn default_config(&self) -> &GatewayConfig {
        &self.default_config
    }

    fn core_defaults() -> GatewayConfig {
        GatewayConfig::new()
            .with(FACTORY_NAME_KEY, "core")
            .with(FACTORY_TITLE_KEY, "Core")
            .with(DEFAULT_OPTIONS_KEY, serde_json::json!({}))
            .with(REQUIRED_OPTIONS_KEY, serde_json::json!([]))
    }
}

impl Default for CoreGatewayFactory {
    fn default() -> Self {
        Self::new(GatewayConfig::new())
    }
}

impl GatewayFactory for CoreGatewayFactory {
    fn create_config(&self, mut config: GatewayConfig) -> Result<GatewayConfig> {
        config.defaults(&self.default_config);
        config.defaults(&Self::core_defaults());
        Ok(config)
    }

    fn create(&self, config: GatewayConfig) -> Result<Arc<dyn Gateway>> {
        let config = self.create_config(config)?;
        Ok(Arc::new(CoreGateway::from_config(config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_config_layers_caller_over_baseline() {
        let core = CoreGatewayFactory::new(
            GatewayConfig::new()
                .with("foo", "baseline")
                .with("bar", "barVal"),
        );

        let config = core
            .create_config(GatewayConfig::new().with("foo", "caller"))
            .unwrap();

        assert_eq!(config.get_str("foo"), Some("caller"));
        assert_eq!(config.get_str("bar"), Some("barVal"));
        assert_eq!(config.get_str(FACTORY_NAME_KEY), Some("core"));
    }

    #[test]
    fn core_creates_gateway_named_core() {
        let gateway = CoreGatewayFactory::default()
            .create(GatewayConfig::new())
            .unwrap();
        assert_eq!(gateway.factory_name(), Some("core"));
    }
}
