//! Built-in gateway factory catalog with lazy instantiation

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use tracing::debug;

use super::offline;
use super::provider::{OptionDefault, ProviderGatewayFactory, ProviderSpec};
use super::GatewayFactory;
use crate::gateway::GatewayFactoryConfig;
use crate::registry::GatewayFactoryRegistry;
use crate::{Error, Result};

use OptionDefault::{Bool, Null, Str};

const SANDBOX: (&str, OptionDefault) = ("sandbox", Bool(true));

macro_rules! provider {
    ($name:literal, $title:literal, [$($req:literal),* $(,)?], [$($opt:expr),* $(,)?]) => {
        ProviderSpec {
            name: $name,
            title: $title,
            required_options: &[$($req),*],
            default_options: &[$($opt),*],
            install: None,
            requires_omnipay_bridge: false,
        }
    };
}

/// Built-in providers, in catalog order.
///
/// Names are a compatibility surface: callers reference them from gateway
/// configs (`factory: stripe_js`).
pub static BUILTIN_FACTORIES: &[ProviderSpec] = &[
    provider!("paypal_express_checkout", "PayPal Express Checkout",
        ["username", "password", "signature"],
        [("username", Str("")), ("password", Str("")), ("signature", Str("")), SANDBOX]),
    provider!("paypal_pro_checkout", "PayPal Pro Checkout",
        ["username", "password", "partner", "vendor", "tender"],
        [("username", Str("")), ("password", Str("")), ("partner", Str("")),
         ("vendor", Str("")), ("tender", Str("C")), ("trxtype", Str("S")), SANDBOX]),
    provider!("paypal_pro_hosted", "PayPal Pro Hosted",
        ["username", "password", "signature", "business"],
        [("username", Str("")), ("password", Str("")), ("signature", Str("")),
         ("business", Str("")), SANDBOX]),
    provider!("paypal_masspay", "PayPal Masspay",
        ["username", "password", "signature"],
        [("username", Str("")), ("password", Str("")), ("signature", Str("")), SANDBOX]),
    provider!("paypal_rest", "PayPal Rest",
        ["client_id", "client_secret"],
        [("client_id", Str("")), ("client_secret", Str("")), ("config_path", Null), SANDBOX]),
    provider!("authorize_net_aim", "Authorize.NET AIM",
        ["login_id", "transaction_key"],
        [("login_id", Str("")), ("transaction_key", Str("")), SANDBOX]),
    provider!("be2bill_direct", "Be2Bill Direct",
        ["identifier", "password"],
        [("identifier", Str("")), ("password", Str("")), SANDBOX]),
    provider!("be2bill_offsite", "Be2Bill Offsite",
        ["identifier", "password"],
        [("identifier", Str("")), ("password", Str("")), SANDBOX]),
    provider!("klarna_checkout", "Klarna Checkout",
        ["merchant_id", "secret"],
        [("merchant_id", Str("")), ("secret", Str("")), ("terms_uri", Null),
         ("checkout_uri", Null), SANDBOX]),
    provider!("klarna_invoice", "Klarna Invoice",
        ["eid", "secret", "country", "language", "currency"],
        [("eid", Str("")), ("secret", Str("")), ("country", Str("")),
         ("language", Str("")), ("currency", Str("")), SANDBOX]),
    ProviderSpec {
        name: "offline",
        title: "Offline",
        required_options: &[],
        default_options: &[],
        install: Some(offline::install),
        requires_omnipay_bridge: false,
    },
    provider!("payex", "Payex",
        ["encryption_key", "account_number"],
        [("encryption_key", Str("")), ("account_number", Str("")), SANDBOX]),
    provider!("stripe_checkout", "Stripe Checkout",
        ["publishable_key", "secret_key"],
        [("publishable_key", Str("")), ("secret_key", Str(""))]),
    provider!("stripe_js", "Stripe.Js",
        ["publishable_key", "secret_key"],
        [("publishable_key", Str("")), ("secret_key", Str(""))]),
    provider!("sofort", "Sofort", ["config_key"], [("config_key", Str("")), ("disable_notification", Bool(false))]),
    provider!("adyen", "Adyen", ["skin_code", "merchant_account", "hmac_key"],
        [("skin_code", Str("")), ("merchant_account", Str("")), ("hmac_key", Str("")), SANDBOX]),
    provider!("alipay", "Alipay", ["partner", "key"], [("partner", Str("")), ("key", Str("")), SANDBOX]),
    provider!("amazon_pay", "Amazon Pay", ["merchant_id", "access_key", "secret_key"],
        [("merchant_id", Str("")), ("access_key", Str("")), ("secret_key", Str("")), SANDBOX]),
    provider!("braintree", "Braintree", ["merchant_id", "public_key", "private_key"],
        [("merchant_id", Str("")), ("public_key", Str("")), ("private_key", Str("")), SANDBOX]),
    provider!("checkout_com", "Checkout.com", ["secret_key"], [("secret_key", Str("")), SANDBOX]),
    provider!("coinbase_commerce", "Coinbase Commerce", ["api_key", "webhook_secret"],
        [("api_key", Str("")), ("webhook_secret", Str(""))]),
    provider!("datatrans", "Datatrans", ["merchant_id", "sign"],
        [("merchant_id", Str("")), ("sign", Str("")), SANDBOX]),
    provider!("dotpay", "Dotpay", ["id", "pin"], [("id", Str("")), ("pin", Str("")), SANDBOX]),
    provider!("epay", "ePay", ["merchant_number"], [("merchant_number", Str("")), ("md5_key", Null)]),
    provider!("gocardless", "GoCardless", ["access_token"], [("access_token", Str("")), SANDBOX]),
    provider!("ideal", "iDEAL", ["merchant_id", "certificate"],
        [("merchant_id", Str("")), ("certificate", Str("")), SANDBOX]),
    provider!("mollie", "Mollie", ["api_key"], [("api_key", Str(""))]),
    provider!("multisafepay", "MultiSafepay", ["api_key"], [("api_key", Str("")), SANDBOX]),
    provider!("netaxept", "Netaxept", ["merchant_id", "token"],
        [("merchant_id", Str("")), ("token", Str("")), SANDBOX]),
    provider!("ogone", "Ogone", ["pspid", "sha_in", "sha_out"],
        [("pspid", Str("")), ("sha_in", Str("")), ("sha_out", Str("")), SANDBOX]),
    provider!("payline", "Payline", ["merchant_id", "access_key", "contract_number"],
        [("merchant_id", Str("")), ("access_key", Str("")), ("contract_number", Str("")), SANDBOX]),
    provider!("paybox", "Paybox", ["site", "rang", "identifiant", "hmac"],
        [("site", Str("")), ("rang", Str("")), ("identifiant", Str("")), ("hmac", Str("")), SANDBOX]),
    provider!("paymill", "Paymill", ["private_key", "public_key"],
        [("private_key", Str("")), ("public_key", Str(""))]),
    provider!("paysafecard", "paysafecard", ["api_key"], [("api_key", Str("")), SANDBOX]),
    provider!("payu", "PayU", ["pos_id", "signature_key"],
        [("pos_id", Str("")), ("signature_key", Str("")), SANDBOX]),
    provider!("postfinance", "PostFinance", ["pspid", "sha_in", "sha_out"],
        [("pspid", Str("")), ("sha_in", Str("")), ("sha_out", Str("")), SANDBOX]),
    provider!("przelewy24", "Przelewy24", ["merchant_id", "crc"],
        [("merchant_id", Str("")), ("crc", Str("")), SANDBOX]),
    provider!("redsys", "Redsys", ["merchant_code", "terminal", "secret_key"],
        [("merchant_code", Str("")), ("terminal", Str("")), ("secret_key", Str("")), SANDBOX]),
    provider!("sagepay", "Sage Pay", ["vendor", "encryption_password"],
        [("vendor", Str("")), ("encryption_password", Str("")), SANDBOX]),
    provider!("skrill", "Skrill", ["merchant_email", "secret_word"],
        [("merchant_email", Str("")), ("secret_word", Str("")), SANDBOX]),
    provider!("square", "Square", ["application_id", "access_token", "location_id"],
        [("application_id", Str("")), ("access_token", Str("")), ("location_id", Str("")), SANDBOX]),
    provider!("worldpay", "Worldpay", ["installation_id", "md5_secret"],
        [("installation_id", Str("")), ("md5_secret", Str("")), SANDBOX]),
    provider!("core", "Core", [], []),
    ProviderSpec {
        name: "omnipay",
        title: "Omnipay",
        required_options: &["type"],
        default_options: &[("type", Str(""))],
        install: None,
        requires_omnipay_bridge: true,
    },
];

/// Optional environment capabilities, injected instead of probed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// The generic e-commerce gateway bridge is available
    pub omnipay_bridge: bool,
}

type FactoryInit = Box<dyn Fn() -> Arc<dyn GatewayFactory> + Send + Sync>;

enum Entry {
    Ready(Arc<dyn GatewayFactory>),
    Lazy {
        cell: OnceLock<Arc<dyn GatewayFactory>>,
        init: FactoryInit,
    },
}

impl Entry {
    fn get(&self) -> Arc<dyn GatewayFactory> {
        match self {
            Self::Ready(factory) => Arc::clone(factory),
            Self::Lazy { cell, init } => Arc::clone(cell.get_or_init(init)),
        }
    }

    fn is_instantiated(&self) -> bool {
        match self {
            Self::Ready(_) => true,
            Self::Lazy { cell, .. } => cell.get().is_some(),
        }
    }
}

/// Name → gateway factory mapping.
///
/// Built-in entries are constructed on first lookup; entries added as
/// instances are handed out unchanged.
#[derive(Default)]
pub struct GatewayFactoryCatalog {
    entries: IndexMap<String, Entry>,
}

impl GatewayFactoryCatalog {
    /// Empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the built-in providers.
    ///
    /// Every entry delegates to `core` and receives its factory-specific
    /// config from `configs`. Providers needing a capability absent from
    /// `capabilities` are skipped.
    #[must_use]
    pub fn builtin(
        core: &Arc<dyn GatewayFactory>,
        configs: &IndexMap<String, GatewayFactoryConfig>,
        capabilities: Capabilities,
    ) -> Self {
        let mut catalog = Self::new();
        for spec in BUILTIN_FACTORIES {
            if spec.requires_omnipay_bridge && !capabilities.omnipay_bridge {
                debug!(factory = spec.name, "Bridge capability unavailable, skipping");
                continue;
            }
            let core = Arc::clone(core);
            let config = configs.get(spec.name).cloned().unwrap_or_default();
            catalog.insert_lazy(spec.name, move || {
                debug!(factory = spec.name, "Instantiating gateway factory");
                Arc::new(ProviderGatewayFactory::new(spec, config.clone(), Arc::clone(&core)))
            });
        }
        catalog
    }

    /// Add or replace an entry with a ready instance
    pub fn insert(&mut self, name: impl Into<String>, factory: Arc<dyn GatewayFactory>) {
        self.entries.insert(name.into(), Entry::Ready(factory));
    }

    /// Add or replace an entry constructed on first lookup
    pub fn insert_lazy<F>(&mut self, name: impl Into<String>, init: F)
    where
        F: Fn() -> Arc<dyn GatewayFactory> + Send + Sync + 'static,
    {
        self.entries.insert(
            name.into(),
            Entry::Lazy {
                cell: OnceLock::new(),
                init: Box::new(init),
            },
        );
    }

    /// Factory by name, instantiating it if needed
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn GatewayFactory>> {
        self.entries.get(name).map(Entry::get)
    }

    /// Whether `name` is in the catalog
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether the entry for `name` has been constructed
    #[must_use]
    pub fn is_instantiated(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(Entry::is_instantiated)
    }

    /// Names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GatewayFactoryRegistry for GatewayFactoryCatalog {
    fn gateway_factory(&self, name: &str) -> Result<Arc<dyn GatewayFactory>> {
        self.get(name)
            .ok_or_else(|| Error::not_found("Gateway factory", name))
    }

    fn gateway_factories(&self) -> IndexMap<String, Arc<dyn GatewayFactory>> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.get()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::CoreGatewayFactory;
    use crate::gateway::{FACTORY_NAME_KEY, GatewayConfig};
    use std::collections::HashSet;

    fn core() -> Arc<dyn GatewayFactory> {
        Arc::new(CoreGatewayFactory::default())
    }

    #[test]
    fn builtin_names_are_unique_and_plentiful() {
        let names: HashSet<_> = BUILTIN_FACTORIES.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), BUILTIN_FACTORIES.len());
        assert!(BUILTIN_FACTORIES.len() > 40);
    }

    #[test]
    fn entries_are_instantiated_on_lookup_only() {
        let catalog = GatewayFactoryCatalog::builtin(&core(), &IndexMap::new(), Capabilities::default());

        assert!(!catalog.is_instantiated("offline"));
        let offline = catalog.get("offline").unwrap();
        assert!(catalog.is_instantiated("offline"));
        assert!(!catalog.is_instantiated("stripe_js"));

        let config = offline.create_config(GatewayConfig::new()).unwrap();
        assert_eq!(config.get_str(FACTORY_NAME_KEY), Some("offline"));
    }

    #[test]
    fn repeated_lookups_share_the_instance() {
        let catalog = GatewayFactoryCatalog::builtin(&core(), &IndexMap::new(), Capabilities::default());
        let first = catalog.get("payex").unwrap();
        let second = catalog.get("payex").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn omnipay_requires_bridge_capability() {
        let without = GatewayFactoryCatalog::builtin(&core(), &IndexMap::new(), Capabilities::default());
        assert!(!without.contains("omnipay"));
        assert!(without.contains("core"));

        let with = GatewayFactoryCatalog::builtin(
            &core(),
            &IndexMap::new(),
            Capabilities { omnipay_bridge: true },
        );
        assert!(with.contains("omnipay"));
        assert_eq!(with.len(), without.len() + 1);
    }

    #[test]
    fn factory_config_reaches_provider() {
        let mut configs = IndexMap::new();
        configs.insert("offline".to_string(), GatewayConfig::new().with("foo", "fooVal"));
        let catalog = GatewayFactoryCatalog::builtin(&core(), &configs, Capabilities::default());

        let config = catalog
            .gateway_factory("offline")
            .unwrap()
            .create_config(GatewayConfig::new())
            .unwrap();
        assert_eq!(config.get_str("foo"), Some("fooVal"));
    }

    #[test]
    fn missing_factory_is_not_found() {
        let catalog = GatewayFactoryCatalog::new();
        assert!(matches!(
            catalog.gateway_factory("nope"),
            Err(Error::NotFound { .. })
        ));
    }
}
