//! Gateway configuration mapping

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::action::Action;
use crate::extension::{Extension, StorageExtension};
use crate::storage::Storage;
use crate::{Error, Result};

/// Key naming the factory a gateway is built with
pub const FACTORY_KEY: &str = "factory";
/// Factory name recorded in a created config
pub const FACTORY_NAME_KEY: &str = "payum.factory_name";
/// Human readable factory title
pub const FACTORY_TITLE_KEY: &str = "payum.factory_title";
/// Provider option defaults (JSON object)
pub const DEFAULT_OPTIONS_KEY: &str = "payum.default_options";
/// Provider options that must be present and non-empty (JSON array)
pub const REQUIRED_OPTIONS_KEY: &str = "payum.required_options";
/// Token storage injected into the core gateway factory config
pub const TOKEN_STORAGE_KEY: &str = "payum.security.token_storage";
/// Prefix of action entries
pub const ACTION_PREFIX: &str = "payum.action.";
/// Prefix of extension entries
pub const EXTENSION_PREFIX: &str = "payum.extension.";

/// A config value: plain data or a live collaborator
#[derive(Clone)]
pub enum ConfigValue {
    /// Plain JSON data (credentials, flags, option tables)
    Value(Value),
    /// A storage
    Storage(Arc<dyn Storage>),
    /// A storage extension
    StorageExtension(Arc<StorageExtension>),
    /// Any other extension
    Extension(Arc<dyn Extension>),
    /// An action
    Action(Arc<dyn Action>),
}

impl ConfigValue {
    /// JSON data, if this is plain data
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// String data, if this is a JSON string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// The extension behind this value, storage extensions included
    #[must_use]
    pub fn as_extension(&self) -> Option<Arc<dyn Extension>> {
        match self {
            Self::StorageExtension(ext) => Some(Arc::clone(ext) as Arc<dyn Extension>),
            Self::Extension(ext) => Some(Arc::clone(ext)),
            _ => None,
        }
    }

    /// The storage behind this value
    #[must_use]
    pub fn as_storage(&self) -> Option<&Arc<dyn Storage>> {
        match self {
            Self::Storage(storage) => Some(storage),
            _ => None,
        }
    }

    /// The storage extension behind this value
    #[must_use]
    pub fn as_storage_extension(&self) -> Option<&Arc<StorageExtension>> {
        match self {
            Self::StorageExtension(ext) => Some(ext),
            _ => None,
        }
    }

    /// The action behind this value
    #[must_use]
    pub fn as_action(&self) -> Option<Arc<dyn Action>> {
        match self {
            Self::Action(action) => Some(Arc::clone(action)),
            _ => None,
        }
    }

    /// Whether the value counts as "not set" for required options
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Value(Value::Null) => true,
            Self::Value(Value::String(s)) => s.is_empty(),
            Self::Value(Value::Array(a)) => a.is_empty(),
            Self::Value(Value::Object(o)) => o.is_empty(),
            _ => false,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Storage(_) => "storage",
            Self::StorageExtension(_) => "storage_extension",
            Self::Extension(_) => "extension",
            Self::Action(_) => "action",
        }
    }
}

impl fmt::Debug for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            other => write!(f, "<{}>", other.kind()),
        }
    }
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<Arc<dyn Storage>> for ConfigValue {
    fn from(storage: Arc<dyn Storage>) -> Self {
        Self::Storage(storage)
    }
}

impl From<Arc<StorageExtension>> for ConfigValue {
    fn from(ext: Arc<StorageExtension>) -> Self {
        Self::StorageExtension(ext)
    }
}

impl From<Arc<dyn Action>> for ConfigValue {
    fn from(action: Arc<dyn Action>) -> Self {
        Self::Action(action)
    }
}

impl From<Arc<dyn Extension>> for ConfigValue {
    fn from(extension: Arc<dyn Extension>) -> Self {
        Self::Extension(extension)
    }
}

/// Ordered mapping of config keys to values.
///
/// Used for gateway configs, gateway factory configs and the core gateway
/// factory config alike. Two combinators drive layering:
/// [`merge`](Self::merge) lets the incoming side win,
/// [`defaults`](Self::defaults) only fills keys that are absent.
#[derive(Clone, Default, Debug)]
pub struct GatewayConfig {
    entries: IndexMap<String, ConfigValue>,
}

/// Factory-level baseline config; same shape as a gateway config
pub type GatewayFactoryConfig = GatewayConfig;

impl GatewayConfig {
    /// Empty config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `value` is not an object.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into()),
            other => Err(Error::Config(format!(
                "gateway config must be an object, got {other}"
            ))),
        }
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a key (keeps the original position on replace)
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Value under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// String value under `key`
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_str)
    }

    /// Whether `key` is present
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove a key
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.entries.shift_remove(key)
    }

    /// Overlay `other`: its keys win on conflict
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    /// Fill keys absent here from `other`
    pub fn defaults(&mut self, other: &Self) {
        for (key, value) in &other.entries {
            if !self.entries.contains_key(key) {
                self.entries.insert(key.clone(), value.clone());
            }
        }
    }

    /// Entries whose key starts with `prefix`, in insertion order
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a ConfigValue)> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain-data entries as a JSON object (live collaborators skipped)
    #[must_use]
    pub fn to_json(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .filter_map(|(k, v)| v.as_value().map(|v| (k.clone(), v.clone())))
            .collect()
    }
}

impl From<Map<String, Value>> for GatewayConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(k, v)| (k, ConfigValue::Value(v)))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for GatewayConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn pairs(config: &GatewayConfig) -> Vec<(String, String)> {
        config
            .iter()
            .map(|(k, v)| (k.to_string(), format!("{v:?}")))
            .collect()
    }

    #[test]
    fn merge_lets_incoming_keys_win_and_keeps_order() {
        let mut config = GatewayConfig::new()
            .with("factory", "aFactory")
            .with("foo", "fooVal")
            .with("bar", "barVal");
        config.merge(&GatewayConfig::new().with("baz", "bazVal").with("foo", "fooNewVal"));

        assert_eq!(
            config.keys().collect::<Vec<_>>(),
            vec!["factory", "foo", "bar", "baz"]
        );
        assert_eq!(config.get_str("foo"), Some("fooNewVal"));
    }

    #[test]
    fn defaults_only_fill_missing_keys() {
        let mut config = GatewayConfig::new().with("sandbox", false);
        config.defaults(&GatewayConfig::new().with("sandbox", true).with("title", "T"));

        assert_eq!(
            pairs(&config),
            vec![
                ("sandbox".to_string(), "false".to_string()),
                ("title".to_string(), "\"T\"".to_string()),
            ]
        );
    }

    #[test]
    fn from_json_requires_object() {
        let config = GatewayConfig::from_json(json!({"factory": "offline"})).unwrap();
        assert_eq!(config.get_str(FACTORY_KEY), Some("offline"));
        assert!(GatewayConfig::from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn emptiness_of_values() {
        assert!(ConfigValue::from("").is_empty());
        assert!(ConfigValue::Value(Value::Null).is_empty());
        assert!(!ConfigValue::from("x").is_empty());
        assert!(!ConfigValue::from(false).is_empty());
    }

    #[test]
    fn prefix_filter() {
        let config = GatewayConfig::new()
            .with("payum.action.capture", "a")
            .with("payum.extension.storage_x", "b")
            .with("payum.action.status", "c");
        let actions: Vec<_> = config.with_prefix(ACTION_PREFIX).map(|(k, _)| k).collect();
        assert_eq!(actions, vec!["payum.action.capture", "payum.action.status"]);
    }
}
