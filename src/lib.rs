//! Payum Library
//!
//! Payment runtime assembled from pluggable gateways, storages, gateway
//! factories and security services.
//!
//! # Features
//!
//! - **Builder**: accumulate configuration, resolve it once into an immutable runtime
//! - **Gateway factories**: built-in provider catalog, instantiated lazily
//! - **Storages**: one per domain model, wired into every gateway through storage extensions
//! - **Layered registries**: a main registry overlaying the locally configured one
//! - **Security**: tokens, token factories and callback request verification

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod extension;
pub mod factory;
pub mod gateway;
pub mod model;
pub mod payum;
pub mod registry;
pub mod request;
pub mod security;
pub mod storage;

pub use builder::PayumBuilder;
pub use error::{Error, Result};
pub use payum::Payum;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// # Errors
///
/// Returns `Error::Config` if a global subscriber is already installed.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    }
    .map_err(|e| Error::Config(e.to_string()))
}
