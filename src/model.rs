//! Domain models persisted by storages
//!
//! Storages work on JSON [`Record`]s. Each storage is bound to one domain
//! model, identified by a [`ModelId`] derived from the model's fully
//! qualified Rust type name.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// A persisted record: an ordered JSON object
pub type Record = Map<String, Value>;

/// Record field holding the identifier of payment-like models
pub const ID_FIELD: &str = "id";

/// Namespace tag for storage extension keys in gateway configs
pub const STORAGE_EXTENSION_PREFIX: &str = "payum.extension.storage_";

// ============================================================================
// ModelId
// ============================================================================

/// Identifier of a domain model (the type a storage persists)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Create from a fully qualified name (`my_shop::orders::Order`)
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Id of a Rust type, taken from its fully qualified type name
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self(std::any::type_name::<T>().to_string())
    }

    /// The fully qualified name
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased, `_`-joined form of the name
    ///
    /// `payum::model::Payment` becomes `payum_model_payment`. Every run of
    /// non-alphanumeric characters collapses into one `_`.
    #[must_use]
    pub fn normalized(&self) -> String {
        let mut out = String::with_capacity(self.0.len());
        let mut pending_sep = false;
        for c in self.0.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_sep && !out.is_empty() {
                    out.push('_');
                }
                pending_sep = false;
                out.push(c.to_ascii_lowercase());
            } else {
                pending_sep = true;
            }
        }
        out
    }

    /// Gateway config key under which this model's storage extension lives
    #[must_use]
    pub fn storage_extension_key(&self) -> String {
        format!("{STORAGE_EXTENSION_PREFIX}{}", self.normalized())
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ModelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModelId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModelId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Reference to a stored record: which model, which id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Model the record belongs to
    pub model: ModelId,
    /// Record id within its storage
    pub id: String,
}

impl Identity {
    /// Create an identity
    pub fn new(model: ModelId, id: impl Into<String>) -> Self {
        Self {
            model,
            id: id.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.model, self.id)
    }
}

// ============================================================================
// Built-in models
// ============================================================================

/// Generic payment record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Storage id, assigned on first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Merchant order number
    #[serde(default)]
    pub number: String,
    /// Free text description
    #[serde(default)]
    pub description: String,
    /// Payer email
    #[serde(default)]
    pub client_email: String,
    /// Payer id in the merchant system
    #[serde(default)]
    pub client_id: String,
    /// Amount in minor units
    #[serde(default)]
    pub total_amount: u64,
    /// ISO 4217 currency code
    #[serde(default)]
    pub currency_code: String,
    /// Gateway-specific details
    #[serde(default)]
    pub details: Record,
}

/// Attribute bag record, the gateway-native view of a payment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Details(pub Record);

/// Payout record (money sent to a recipient)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    /// Storage id, assigned on first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Recipient id in the merchant system
    #[serde(default)]
    pub recipient_id: String,
    /// Recipient email
    #[serde(default)]
    pub recipient_email: String,
    /// Amount in minor units
    #[serde(default)]
    pub total_amount: u64,
    /// ISO 4217 currency code
    #[serde(default)]
    pub currency_code: String,
    /// Free text description
    #[serde(default)]
    pub description: String,
    /// Gateway-specific details
    #[serde(default)]
    pub details: Record,
}

/// Convert a serializable model into a storage record
pub fn to_record<T: Serialize>(model: &T) -> Result<Record> {
    match serde_json::to_value(model)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Storage(format!(
            "model must serialize to an object, got {other}"
        ))),
    }
}

/// Convert a storage record back into a typed model
pub fn from_record<T: for<'de> Deserialize<'de>>(record: Record) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}
