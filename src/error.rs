//! Error types for the payment runtime

use std::io;

use thiserror::Error;

use crate::builder::SlotKind;

/// Result type alias for the payment runtime
pub type Result<T> = std::result::Result<T, Error>;

/// Payment runtime errors
#[derive(Error, Debug)]
pub enum Error {
    /// A collaborator the runtime cannot work without was never configured
    #[error("{0}")]
    MissingRequiredDependency(String),

    /// Gateway config is unusable (missing or empty `factory`)
    #[error("{reason} Gateway: {gateway}")]
    InvalidGatewayConfig {
        /// Offending gateway name
        gateway: String,
        /// What is wrong with it
        reason: String,
    },

    /// A builder closure returned something that does not fit its slot
    #[error("Builder returned invalid instance for {slot}: expected {expected}, got {returned}")]
    InvalidBuilderResult {
        /// Slot whose builder misbehaved
        slot: SlotKind,
        /// Capability the slot needs
        expected: &'static str,
        /// Capability the builder produced
        returned: &'static str,
    },

    /// Lookup miss in every backing registry
    #[error("{kind} \"{name}\" does not exist")]
    NotFound {
        /// What was looked up (gateway, storage, gateway factory)
        kind: &'static str,
        /// Requested name or model id
        name: String,
    },

    /// Provider options required by a gateway factory are absent
    #[error("The {} fields are required. Factory: {factory}", .missing.join(", "))]
    InvalidGatewayOptions {
        /// Factory that rejected the config
        factory: String,
        /// Missing option names
        missing: Vec<String>,
    },

    /// No action of the gateway supports the request
    #[error("Request {request} is not supported by the gateway")]
    RequestNotSupported {
        /// Request description
        request: String,
    },

    /// Storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP request verification failure
    #[error("HTTP {status}: {message}")]
    Verification {
        /// HTTP status code to answer with
        status: u16,
        /// Message
        message: String,
    },

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Lookup miss for a named item
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Verification failure with an HTTP status
    pub fn verification(status: u16, message: impl Into<String>) -> Self {
        Self::Verification {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code a web layer should answer with
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Verification { status, .. } => *status,
            Self::NotFound { .. } => 404,
            Self::RequestNotSupported { .. } | Self::InvalidGatewayOptions { .. } => 400,
            _ => 500,
        }
    }
}
