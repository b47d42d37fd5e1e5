//! Provider gateway factories built from static provider specs

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::GatewayFactory;
use crate::gateway::{
    ConfigValue, DEFAULT_OPTIONS_KEY, FACTORY_NAME_KEY, FACTORY_TITLE_KEY, Gateway, GatewayConfig,
    GatewayFactoryConfig, REQUIRED_OPTIONS_KEY,
};
use crate::{Error, Result};

/// Default value of a provider option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionDefault {
    /// Boolean flag
    Bool(bool),
    /// String value
    Str(&'static str),
    /// Present but unset; usually paired with a required option
    Null,
}

impl OptionDefault {
    fn to_value(self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(b),
            Self::Str(s) => Value::String(s.to_string()),
            Self::Null => Value::Null,
        }
    }
}

/// Static description of a payment provider integration
#[derive(Debug)]
pub struct ProviderSpec {
    /// Catalog name (`stripe_js`)
    pub name: &'static str,
    /// Display title
    pub title: &'static str,
    /// Options that must be present and non-empty at `create`
    pub required_options: &'static [&'static str],
    /// Option defaults, filled under the caller's config
    pub default_options: &'static [(&'static str, OptionDefault)],
    /// Adds provider actions/extensions to a config
    pub install: Option<fn(&mut GatewayConfig)>,
    /// Only registered when the optional bridge capability is available
    pub requires_omnipay_bridge: bool,
}

impl ProviderSpec {
    fn provider_config(&self) -> GatewayConfig {
        let default_options: Map<String, Value> = self
            .default_options
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.to_value()))
            .collect();
        let required: Vec<Value> = self
            .required_options
            .iter()
            .map(|o| Value::String((*o).to_string()))
            .collect();

        let mut config = GatewayConfig::new()
            .with(FACTORY_NAME_KEY, self.name)
            .with(FACTORY_TITLE_KEY, self.title)
            .with(DEFAULT_OPTIONS_KEY, Value::Object(default_options))
            .with(REQUIRED_OPTIONS_KEY, Value::Array(required));
        if let Some(install) = self.install {
            install(&mut config);
        }
        config
    }
}

/// Gateway factory for one provider.
///
/// Config layering on `create_config`, highest priority first: the caller's
/// config, the factory-specific config added through the builder, the
/// provider defaults, the core gateway factory's config, and finally the
/// provider's default options.
pub struct ProviderGatewayFactory {
    spec: &'static ProviderSpec,
    config: GatewayFactoryConfig,
    core: Arc<dyn GatewayFactory>,
}

impl ProviderGatewayFactory {
    /// Factory for `spec` delegating to `core`
    pub fn new(
        spec: &'static ProviderSpec,
        config: GatewayFactoryConfig,
        core: Arc<dyn GatewayFactory>,
    ) -> Self {
        Self { spec, config, core }
    }

    /// Provider spec
    #[must_use]
    pub fn spec(&self) -> &'static ProviderSpec {
        self.spec
    }

    /// Core gateway factory this factory delegates to
    #[must_use]
    pub fn core_gateway_factory(&self) -> &Arc<dyn GatewayFactory> {
        &self.core
    }

    fn missing_required(config: &GatewayConfig) -> Vec<String> {
        let Some(Value::Array(required)) =
            config.get(REQUIRED_OPTIONS_KEY).and_then(ConfigValue::as_value)
        else {
            return Vec::new();
        };
        required
            .iter()
            .filter_map(Value::as_str)
            .filter(|key| config.get(key).is_none_or(|v| v.is_empty()))
            .map(str::to_string)
            .collect()
    }
}

impl GatewayFactory for ProviderGatewayFactory {
    fn create_config(&self, mut config: GatewayConfig) -> Result<GatewayConfig> {
        config.defaults(&self.config);
        config.defaults(&self.spec.provider_config());
        let mut config = self.core.create_config(config)?;

        let default_options = config
            .get(DEFAULT_OPTIONS_KEY)
            .and_then(ConfigValue::as_value)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        config.defaults(&default_options.into());
        Ok(config)
    }

    fn create(&self, config: GatewayConfig) -> Result<Arc<dyn Gateway>> {
        let config = self.create_config(config)?;
        let missing = Self::missing_required(&config);
        if !missing.is_empty() {
            return Err(Error::InvalidGatewayOptions {
                factory: self.spec.name.to_string(),
                missing,
            });
        }
        debug!(factory = self.spec.name, "Creating gateway");
        self.core.create(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::CoreGatewayFactory;

    static TEST_PROVIDER: ProviderSpec = ProviderSpec {
        name: "test_provider",
        title: "Test Provider",
        required_options: &["api_key"],
        default_options: &[
            ("api_key", OptionDefault::Null),
            ("sandbox", OptionDefault::Bool(true)),
        ],
        install: None,
        requires_omnipay_bridge: false,
    };

    fn factory(config: GatewayConfig) -> ProviderGatewayFactory {
        ProviderGatewayFactory::new(
            &TEST_PROVIDER,
            config,
            Arc::new(CoreGatewayFactory::new(
                GatewayConfig::new().with("core_key", "coreVal"),
            )),
        )
    }

    #[test]
    fn create_config_layers_everything() {
        let factory = factory(
            GatewayConfig::new()
                .with("sandbox", false)
                .with("foo", "factory"),
        );

        let config = factory
            .create_config(GatewayConfig::new().with("foo", "gateway"))
            .unwrap();

        assert_eq!(config.get_str("foo"), Some("gateway"));
        assert_eq!(config.get_str("core_key"), Some("coreVal"));
        assert_eq!(config.get_str(FACTORY_NAME_KEY), Some("test_provider"));
        assert_eq!(
            config.get("sandbox").and_then(ConfigValue::as_value),
            Some(&Value::Bool(false))
        );
    }

    #[test]
    fn create_rejects_missing_required_options() {
        let err = factory(GatewayConfig::new())
            .create(GatewayConfig::new())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::InvalidGatewayOptions { ref missing, .. } if missing == &vec!["api_key".to_string()]
        ));
    }

    #[test]
    fn create_succeeds_with_required_options() {
        let gateway = factory(GatewayConfig::new())
            .create(GatewayConfig::new().with("api_key", "secret"))
            .unwrap();
        assert_eq!(gateway.factory_name(), Some("test_provider"));
    }
}
