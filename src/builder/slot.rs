//! Builder-or-instance slots and the components builder closures return

use std::fmt;
use std::sync::Arc;

use crate::factory::GatewayFactory;
use crate::gateway::GatewayConfig;
use crate::registry::StorageRegistry;
use crate::security::{GenericTokenFactory, HttpRequestVerifier, TokenFactory, TokenPaths};
use crate::storage::Storage;
use crate::{Error, Result};

/// Closure building the token storage
pub type TokenStorageBuilder = Box<dyn FnOnce() -> Component + Send>;
/// Closure building the request verifier from the token storage
pub type HttpRequestVerifierBuilder = Box<dyn FnOnce(Arc<dyn Storage>) -> Component + Send>;
/// Closure building the token factory from the token storage and storage registry
pub type TokenFactoryBuilder =
    Box<dyn FnOnce(Arc<dyn Storage>, Arc<dyn StorageRegistry>) -> Component + Send>;
/// Closure building the generic token factory from the token factory and path table
pub type GenericTokenFactoryBuilder =
    Box<dyn FnOnce(Arc<dyn TokenFactory>, TokenPaths) -> Component + Send>;
/// Closure building the core gateway factory from the accumulated core config
pub type CoreGatewayFactoryBuilder = Box<dyn FnOnce(GatewayConfig) -> Component + Send>;
/// Closure building a named gateway factory from its config and the core factory
pub type GatewayFactoryBuilder =
    Box<dyn FnOnce(GatewayConfig, Arc<dyn GatewayFactory>) -> Arc<dyn GatewayFactory> + Send>;

/// Security or factory slot of the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Token storage
    TokenStorage,
    /// HTTP request verifier
    HttpRequestVerifier,
    /// Token factory
    TokenFactory,
    /// Generic token factory
    GenericTokenFactory,
    /// Core gateway factory
    CoreGatewayFactory,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TokenStorage => "token storage",
            Self::HttpRequestVerifier => "http request verifier",
            Self::TokenFactory => "token factory",
            Self::GenericTokenFactory => "generic token factory",
            Self::CoreGatewayFactory => "core gateway factory",
        };
        f.write_str(name)
    }
}

/// What a builder closure produced.
///
/// The builder checks the variant against the slot the closure was set
/// for; a mismatch fails the build with `Error::InvalidBuilderResult`.
pub enum Component {
    /// A storage
    Storage(Arc<dyn Storage>),
    /// A request verifier
    HttpRequestVerifier(Arc<dyn HttpRequestVerifier>),
    /// A token factory
    TokenFactory(Arc<dyn TokenFactory>),
    /// A generic token factory, also usable as a token factory
    GenericTokenFactory(Arc<dyn GenericTokenFactory>),
    /// A gateway factory
    GatewayFactory(Arc<dyn GatewayFactory>),
}

impl Component {
    /// Capability name, as reported in errors
    #[must_use]
    pub fn capability(&self) -> &'static str {
        match self {
            Self::Storage(_) => "storage",
            Self::HttpRequestVerifier(_) => "http request verifier",
            Self::TokenFactory(_) => "token factory",
            Self::GenericTokenFactory(_) => "generic token factory",
            Self::GatewayFactory(_) => "gateway factory",
        }
    }

    fn mismatch(&self, slot: SlotKind, expected: &'static str) -> Error {
        Error::InvalidBuilderResult {
            slot,
            expected,
            returned: self.capability(),
        }
    }

    pub(crate) fn into_storage(self, slot: SlotKind) -> Result<Arc<dyn Storage>> {
        match self {
            Self::Storage(storage) => Ok(storage),
            other => Err(other.mismatch(slot, "storage")),
        }
    }

    pub(crate) fn into_http_request_verifier(
        self,
        slot: SlotKind,
    ) -> Result<Arc<dyn HttpRequestVerifier>> {
        match self {
            Self::HttpRequestVerifier(verifier) => Ok(verifier),
            other => Err(other.mismatch(slot, "http request verifier")),
        }
    }

    pub(crate) fn into_token_factory(self, slot: SlotKind) -> Result<Arc<dyn TokenFactory>> {
        match self {
            Self::TokenFactory(factory) => Ok(factory),
            Self::GenericTokenFactory(factory) => Ok(factory as Arc<dyn TokenFactory>),
            other => Err(other.mismatch(slot, "token factory")),
        }
    }

    pub(crate) fn into_generic_token_factory(
        self,
        slot: SlotKind,
    ) -> Result<Arc<dyn GenericTokenFactory>> {
        match self {
            Self::GenericTokenFactory(factory) => Ok(factory),
            other => Err(other.mismatch(slot, "generic token factory")),
        }
    }

    pub(crate) fn into_gateway_factory(self, slot: SlotKind) -> Result<Arc<dyn GatewayFactory>> {
        match self {
            Self::GatewayFactory(factory) => Ok(factory),
            other => Err(other.mismatch(slot, "gateway factory")),
        }
    }
}

impl From<Arc<dyn Storage>> for Component {
    fn from(storage: Arc<dyn Storage>) -> Self {
        Self::Storage(storage)
    }
}

impl From<Arc<dyn HttpRequestVerifier>> for Component {
    fn from(verifier: Arc<dyn HttpRequestVerifier>) -> Self {
        Self::HttpRequestVerifier(verifier)
    }
}

impl From<Arc<dyn TokenFactory>> for Component {
    fn from(factory: Arc<dyn TokenFactory>) -> Self {
        Self::TokenFactory(factory)
    }
}

impl From<Arc<dyn GenericTokenFactory>> for Component {
    fn from(factory: Arc<dyn GenericTokenFactory>) -> Self {
        Self::GenericTokenFactory(factory)
    }
}

impl From<Arc<dyn GatewayFactory>> for Component {
    fn from(factory: Arc<dyn GatewayFactory>) -> Self {
        Self::GatewayFactory(factory)
    }
}

/// Unset, a ready instance, or a closure producing one
pub(crate) enum BuilderSlot<T: ?Sized, B> {
    Unset,
    Instance(Arc<T>),
    Builder(B),
}

impl<T: ?Sized, B> Default for BuilderSlot<T, B> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T: ?Sized, B> BuilderSlot<T, B> {
    /// Instance as given, the builder's validated result, or the default
    pub(crate) fn resolve(
        self,
        build: impl FnOnce(B) -> Result<Arc<T>>,
        default: impl FnOnce() -> Result<Arc<T>>,
    ) -> Result<Arc<T>> {
        match self {
            Self::Instance(instance) => Ok(instance),
            Self::Builder(builder) => build(builder),
            Self::Unset => default(),
        }
    }
}
