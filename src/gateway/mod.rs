//! Gateways: configured integrations executing payment requests

mod config;

pub use config::{
    ACTION_PREFIX, ConfigValue, DEFAULT_OPTIONS_KEY, EXTENSION_PREFIX, FACTORY_KEY,
    FACTORY_NAME_KEY, FACTORY_TITLE_KEY, GatewayConfig, GatewayFactoryConfig,
    REQUIRED_OPTIONS_KEY, TOKEN_STORAGE_KEY,
};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::action::Action;
use crate::extension::Extension;
use crate::request::Request;
use crate::{Error, Result};

/// A configured integration with one payment provider.
#[async_trait]
pub trait Gateway: Send + Sync + 'static {
    /// Execute a request against the provider.
    ///
    /// # Errors
    ///
    /// Returns `Error::RequestNotSupported` if nothing handles the request,
    /// or whatever an action or extension failed with.
    async fn execute(&self, request: &mut Request) -> Result<()>;

    /// Name of the factory that built this gateway, if known.
    fn factory_name(&self) -> Option<&str> {
        None
    }
}

/// Gateway assembled by the core gateway factory from a created config.
///
/// Actions come from `payum.action.*` entries, extensions from
/// `payum.extension.*` entries, both in config order.
pub struct CoreGateway {
    factory_name: Option<String>,
    actions: Vec<Arc<dyn Action>>,
    extensions: Vec<Arc<dyn Extension>>,
    config: GatewayConfig,
}

impl CoreGateway {
    /// Assemble from a fully created config
    #[must_use]
    pub fn from_config(config: GatewayConfig) -> Self {
        let actions = config
            .with_prefix(ACTION_PREFIX)
            .filter_map(|(_, v)| v.as_action())
            .collect();
        let extensions = config
            .with_prefix(EXTENSION_PREFIX)
            .filter_map(|(_, v)| v.as_extension())
            .collect();
        Self {
            factory_name: config.get_str(FACTORY_NAME_KEY).map(str::to_string),
            actions,
            extensions,
            config,
        }
    }

    /// Config the gateway was built from
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Number of installed actions
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Number of installed extensions
    #[must_use]
    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }
}

#[async_trait]
impl Gateway for CoreGateway {
    async fn execute(&self, request: &mut Request) -> Result<()> {
        for extension in &self.extensions {
            extension.on_pre_execute(request).await?;
        }

        let action = self
            .actions
            .iter()
            .find(|a| a.supports(request))
            .ok_or_else(|| Error::RequestNotSupported {
                request: request.to_string(),
            })?;
        debug!(
            factory = self.factory_name.as_deref().unwrap_or("core"),
            request = %request,
            "Executing request"
        );

        for extension in &self.extensions {
            extension.on_execute(request).await?;
        }
        action.execute(request).await?;
        for extension in &self.extensions {
            extension.on_post_execute(request).await?;
        }
        Ok(())
    }

    fn factory_name(&self) -> Option<&str> {
        self.factory_name.as_deref()
    }
}
