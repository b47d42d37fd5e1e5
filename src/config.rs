//! Configuration management

use std::{env, path::Path};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::builder::PayumBuilder;
use crate::factory::Capabilities;
use crate::gateway::GatewayConfig;
use crate::{Error, Result};

/// Environment prefix for overrides (`PAYUM_GATEWAYS__CASH__FACTORY=offline`)
pub const ENV_PREFIX: &str = "PAYUM_";

/// File configuration of the payment runtime
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PayumConfig {
    /// Environment files to load before processing config.
    /// Paths support ~ expansion. Loaded in order, later files override earlier.
    pub env_files: Vec<String>,
    /// Base URL of token URLs
    pub base_url: Option<String>,
    /// Provide in-memory default storages and token storage
    pub default_storages: bool,
    /// The generic e-commerce bridge is available
    pub omnipay_bridge: bool,
    /// Overrides of the generic token factory paths
    pub token_paths: IndexMap<String, String>,
    /// Core gateway factory config
    pub core: Map<String, Value>,
    /// Per-factory baseline configs
    pub gateway_factories: IndexMap<String, Map<String, Value>>,
    /// Gateways by name; each needs a `factory`
    pub gateways: IndexMap<String, Map<String, Value>>,
}

impl PayumConfig {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file is missing or malformed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        // Env files first, placeholders may refer to them
        config.load_env_files();
        config.expand_env_vars()?;

        Ok(config)
    }

    /// Feed this configuration into `builder`
    #[must_use]
    pub fn apply(&self, mut builder: PayumBuilder) -> PayumBuilder {
        if self.default_storages {
            builder = builder.add_default_storages();
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.set_base_url(base_url.clone());
        }
        if !self.token_paths.is_empty() {
            builder = builder.set_generic_token_factory_paths(self.token_paths.clone());
        }
        if !self.core.is_empty() {
            builder =
                builder.add_core_gateway_factory_config(GatewayConfig::from(self.core.clone()));
        }
        for (name, config) in &self.gateway_factories {
            builder =
                builder.add_gateway_factory_config(name, GatewayConfig::from(config.clone()));
        }
        for (name, config) in &self.gateways {
            builder = builder.add_gateway_config(name, GatewayConfig::from(config.clone()));
        }
        builder.set_capabilities(Capabilities {
            omnipay_bridge: self.omnipay_bridge,
        })
    }

    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let expanded = match (path_str.strip_prefix('~'), dirs::home_dir()) {
                (Some(rest), Some(home)) => format!("{}{rest}", home.display()),
                _ => path_str.clone(),
            };

            let path = Path::new(&expanded);
            if !path.exists() {
                tracing::debug!("Env file not found (skipped): {expanded}");
                continue;
            }
            match dotenvy::from_path(path) {
                Ok(()) => tracing::info!("Loaded env file: {expanded}"),
                Err(e) => tracing::warn!("Failed to load env file {expanded}: {e}"),
            }
        }
    }

    /// Expand `${VAR}` and `${VAR:-default}` in gateway, factory and core values
    fn expand_env_vars(&mut self) -> Result<()> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
            .map_err(|e| Error::Config(e.to_string()))?;

        for config in self
            .gateways
            .values_mut()
            .chain(self.gateway_factories.values_mut())
            .chain(std::iter::once(&mut self.core))
        {
            for value in config.values_mut() {
                Self::expand_value(&re, value);
            }
        }
        if let Some(base_url) = &mut self.base_url {
            *base_url = Self::expand_string(&re, base_url);
        }
        Ok(())
    }

    fn expand_value(re: &Regex, value: &mut Value) {
        match value {
            Value::String(s) => *s = Self::expand_string(re, s),
            Value::Array(items) => items.iter_mut().for_each(|v| Self::expand_value(re, v)),
            Value::Object(map) => map.values_mut().for_each(|v| Self::expand_value(re, v)),
            _ => {}
        }
    }

    /// Expand environment variables in a string
    fn expand_string(re: &Regex, value: &str) -> String {
        re.replace_all(value, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default = caps.get(2).map_or("", |m| m.as_str());
            env::var(var_name).unwrap_or_else(|_| default.to_string())
        })
        .into_owned()
    }
}
