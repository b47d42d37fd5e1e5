//! Builder integration tests

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use payum::builder::{Component, SlotKind, default_storage_models};
use payum::factory::{Capabilities, CoreGatewayFactory, GatewayFactory, ProviderGatewayFactory};
use payum::gateway::{Gateway, GatewayConfig, TOKEN_STORAGE_KEY};
use payum::model::{ModelId, Payment, STORAGE_EXTENSION_PREFIX};
use payum::registry::{GatewayFactoryRegistry, GatewayRegistry, StorageRegistry};
use payum::security::{
    GenericTokenFactory, HttpRequestVerifier, PlainHttpRequestVerifier, TOKEN_ID_FIELD, Token,
};
use payum::storage::{MemoryStorage, Storage};
use payum::{Error, PayumBuilder};

fn core_gateway() -> Arc<dyn Gateway> {
    CoreGatewayFactory::default()
        .create(GatewayConfig::new())
        .unwrap()
}

fn storage(model: &str) -> Arc<dyn Storage> {
    Arc::new(MemoryStorage::new(ModelId::new(model)))
}

fn token_storage() -> Arc<dyn Storage> {
    Arc::new(MemoryStorage::with_id_field(Token::model_id(), TOKEN_ID_FIELD))
}

// ============================================================================
// Token storage
// ============================================================================

#[test]
fn build_without_token_storage_fails() {
    let err = PayumBuilder::new()
        .add_storage("app::Order", storage("app::Order"))
        .add_gateway("foo", core_gateway())
        .build()
        .err()
        .unwrap();

    assert!(matches!(err, Error::MissingRequiredDependency(_)));
    assert_eq!(err.to_string(), "Token storage must be configured.");
}

#[test]
fn explicit_token_storage_is_used_as_is() {
    let tokens = token_storage();
    let payum = PayumBuilder::new()
        .set_token_storage(Arc::clone(&tokens))
        .build()
        .unwrap();

    assert!(Arc::ptr_eq(payum.token_storage(), &tokens));
    assert!(payum.storages().is_empty());
}

#[test]
fn token_storage_builder_result_is_used() {
    let tokens = token_storage();
    let expected = Arc::clone(&tokens);
    let payum = PayumBuilder::new()
        .set_token_storage_builder(move || Component::Storage(tokens))
        .build()
        .unwrap();

    assert!(Arc::ptr_eq(payum.token_storage(), &expected));
}

// ============================================================================
// Storages
// ============================================================================

#[test]
fn default_storages_cover_three_models() {
    let payum = PayumBuilder::new().add_default_storages().build().unwrap();

    let storages = payum.storages();
    let models: Vec<_> = storages.keys().cloned().collect();
    assert_eq!(models, default_storage_models().to_vec());
}

#[test]
fn explicit_storage_wins_over_default() {
    let payments = storage("payum::model::Payment");
    let payum = PayumBuilder::new()
        .add_storage(ModelId::of::<Payment>(), Arc::clone(&payments))
        .add_default_storages()
        .build()
        .unwrap();

    assert_eq!(payum.storages().len(), 3);
    let resolved = payum.storage(ModelId::of::<Payment>().as_str()).unwrap();
    assert!(Arc::ptr_eq(&resolved, &payments));
}

#[test]
fn storage_is_wired_into_core_config_as_extension() {
    let orders = storage("App\\Model\\Order");
    let payum = PayumBuilder::new()
        .set_token_storage(token_storage())
        .add_storage("App\\Model\\Order", Arc::clone(&orders))
        .build()
        .unwrap();

    let config = payum
        .core_gateway_factory()
        .create_config(GatewayConfig::new())
        .unwrap();

    let extension_keys: Vec<_> = config
        .keys()
        .filter(|k| k.starts_with(STORAGE_EXTENSION_PREFIX))
        .collect();
    assert_eq!(extension_keys, vec!["payum.extension.storage_app_model_order"]);

    let extension = config
        .get("payum.extension.storage_app_model_order")
        .and_then(|v| v.as_storage_extension())
        .unwrap();
    assert!(Arc::ptr_eq(extension.storage(), &orders));

    let tokens = config.get(TOKEN_STORAGE_KEY).and_then(|v| v.as_storage()).unwrap();
    assert!(Arc::ptr_eq(tokens, payum.token_storage()));
}

// ============================================================================
// Gateways
// ============================================================================

#[test]
fn gateway_instance_is_returned_unchanged() {
    let gateway = core_gateway();
    let payum = PayumBuilder::new()
        .add_default_storages()
        .add_gateway("a_gateway", Arc::clone(&gateway))
        .build()
        .unwrap();

    assert!(Arc::ptr_eq(&payum.gateway("a_gateway").unwrap(), &gateway));
}

#[test]
fn offline_config_builds_offline_gateway() {
    let payum = PayumBuilder::new()
        .add_default_storages()
        .add_gateway_config("cash", GatewayConfig::new().with("factory", "offline"))
        .build()
        .unwrap();

    let gateway = payum.gateway("cash").unwrap();
    assert_eq!(gateway.factory_name(), Some("offline"));
}

#[test]
fn repeated_configs_merge_with_later_keys_winning() {
    let seen = Arc::new(Mutex::new(None::<GatewayConfig>));
    let recorder = Arc::clone(&seen);

    let payum = PayumBuilder::new()
        .add_default_storages()
        .add_gateway_factory_builder("recording", move |_config, core| {
            Arc::new(RecordingFactory {
                core,
                seen: recorder,
            })
        })
        .add_gateway_config(
            "merged",
            GatewayConfig::new()
                .with("factory", "recording")
                .with("foo", "fooVal")
                .with("bar", "barVal"),
        )
        .add_gateway_config("merged", GatewayConfig::new().with("bar", "barOverride"))
        .build()
        .unwrap();

    assert!(payum.gateway("merged").is_ok());
    let config = seen.lock().clone().unwrap();
    assert_eq!(config.get_str("foo"), Some("fooVal"));
    assert_eq!(config.get_str("bar"), Some("barOverride"));
}

/// Factory recording the config it creates gateways from
struct RecordingFactory {
    core: Arc<dyn GatewayFactory>,
    seen: Arc<Mutex<Option<GatewayConfig>>>,
}

impl GatewayFactory for RecordingFactory {
    fn create_config(&self, config: GatewayConfig) -> payum::Result<GatewayConfig> {
        self.core.create_config(config)
    }

    fn create(&self, config: GatewayConfig) -> payum::Result<Arc<dyn Gateway>> {
        *self.seen.lock() = Some(config.clone());
        self.core.create(config)
    }
}

#[test]
fn factory_config_reaches_factory_builder_and_gateway() {
    let builder_saw = Arc::new(Mutex::new(None::<GatewayConfig>));
    let builder_recorder = Arc::clone(&builder_saw);
    let created_with = Arc::new(Mutex::new(None::<GatewayConfig>));
    let created_recorder = Arc::clone(&created_with);

    PayumBuilder::new()
        .add_default_storages()
        .add_gateway_factory_config("custom", GatewayConfig::new().with("foo", "fooVal"))
        .add_gateway_factory_config("custom", GatewayConfig::new().with("bar", "barVal"))
        .add_gateway_factory_builder("custom", move |config, core| {
            *builder_recorder.lock() = Some(config);
            Arc::new(RecordingFactory {
                core,
                seen: created_recorder,
            })
        })
        .add_gateway_config(
            "g",
            GatewayConfig::new()
                .with("factory", "custom")
                .with("foo", "gatewayVal"),
        )
        .build()
        .unwrap();

    let factory_config = builder_saw.lock().clone().unwrap();
    assert_eq!(factory_config.get_str("foo"), Some("fooVal"));
    assert_eq!(factory_config.get_str("bar"), Some("barVal"));

    let gateway_config = created_with.lock().clone().unwrap();
    assert_eq!(gateway_config.get_str("foo"), Some("gatewayVal"));
    assert_eq!(gateway_config.get_str("bar"), Some("barVal"));
}

#[test]
fn core_factory_name_builds_gateway_over_core_config() {
    let created_with = Arc::new(Mutex::new(None::<GatewayConfig>));
    let recorder = Arc::clone(&created_with);

    let payum = PayumBuilder::new()
        .add_default_storages()
        .set_core_gateway_factory_builder(move |config| {
            Component::GatewayFactory(Arc::new(RecordingFactory {
                core: Arc::new(CoreGatewayFactory::new(config)),
                seen: Arc::clone(&recorder),
            }))
        })
        .add_gateway_config("foo", GatewayConfig::new().with("factory", "core"))
        .build()
        .unwrap();

    let gateway = payum.gateway("foo").unwrap();
    assert_eq!(gateway.factory_name(), Some("core"));

    let config = created_with.lock().clone().unwrap();
    assert!(config.contains_key(TOKEN_STORAGE_KEY));
    let mut extension_keys: Vec<_> = config
        .keys()
        .filter(|k| k.starts_with(STORAGE_EXTENSION_PREFIX))
        .map(str::to_string)
        .collect();
    extension_keys.sort();
    let mut expected: Vec<_> = default_storage_models()
        .iter()
        .map(ModelId::storage_extension_key)
        .collect();
    expected.sort();
    assert_eq!(extension_keys, expected);
}

#[test]
fn factory_selector_is_not_passed_to_the_factory() {
    let created_with = Arc::new(Mutex::new(None::<GatewayConfig>));
    let recorder = Arc::clone(&created_with);

    PayumBuilder::new()
        .add_default_storages()
        .add_gateway_factory_builder("recording", move |_config, core| {
            Arc::new(RecordingFactory {
                core,
                seen: recorder,
            })
        })
        .add_gateway_config(
            "g",
            GatewayConfig::new()
                .with("factory", "recording")
                .with("foo", "fooVal"),
        )
        .build()
        .unwrap();

    let config = created_with.lock().clone().unwrap();
    assert!(!config.contains_key("factory"));
    assert_eq!(config.get_str("foo"), Some("fooVal"));
}

#[test]
fn user_factory_replaces_builtin() {
    let custom: Arc<dyn GatewayFactory> = Arc::new(CoreGatewayFactory::default());
    let payum = PayumBuilder::new()
        .add_default_storages()
        .add_gateway_factory("offline", Arc::clone(&custom))
        .build()
        .unwrap();

    let resolved = payum.gateway_factory("offline").unwrap();
    assert!(Arc::ptr_eq(&resolved, &custom));
}

// ============================================================================
// Core gateway factory
// ============================================================================

#[test]
fn core_factory_builder_gets_accumulated_core_config() {
    let seen = Arc::new(Mutex::new(None::<GatewayConfig>));
    let recorder = Arc::clone(&seen);

    let payum = PayumBuilder::new()
        .add_default_storages()
        .add_core_gateway_factory_config(GatewayConfig::new().with("foo", "fooVal"))
        .set_core_gateway_factory_builder(move |config| {
            *recorder.lock() = Some(config.clone());
            Component::GatewayFactory(Arc::new(CoreGatewayFactory::new(config)))
        })
        .build()
        .unwrap();

    let config = seen.lock().clone().unwrap();
    assert_eq!(config.get_str("foo"), Some("fooVal"));
    assert!(config.contains_key(TOKEN_STORAGE_KEY));
    assert_eq!(
        config
            .keys()
            .filter(|k| k.starts_with(STORAGE_EXTENSION_PREFIX))
            .count(),
        3
    );

    let offline = payum.gateway_factory("offline").unwrap();
    let provider_config = offline.create_config(GatewayConfig::new()).unwrap();
    assert_eq!(provider_config.get_str("foo"), Some("fooVal"));
}

#[test]
fn core_factory_instance_is_injected_into_builtins() {
    let core: Arc<dyn GatewayFactory> =
        Arc::new(CoreGatewayFactory::new(GatewayConfig::new().with("marker", "custom_core")));
    let payum = PayumBuilder::new()
        .add_default_storages()
        .set_core_gateway_factory(Arc::clone(&core))
        .build()
        .unwrap();

    assert!(Arc::ptr_eq(payum.core_gateway_factory(), &core));
    let config = payum
        .gateway_factory("stripe_js")
        .unwrap()
        .create_config(GatewayConfig::new())
        .unwrap();
    assert_eq!(config.get_str("marker"), Some("custom_core"));
}

// ============================================================================
// Builder result validation
// ============================================================================

fn assert_invalid_builder_result(result: payum::Result<payum::Payum>, expected: SlotKind) {
    match result {
        Err(Error::InvalidBuilderResult { slot, .. }) => assert_eq!(slot, expected),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("build unexpectedly succeeded"),
    }
}

#[test]
fn verifier_builder_must_return_verifier() {
    let result = PayumBuilder::new()
        .add_default_storages()
        .set_http_request_verifier_builder(Component::Storage)
        .build();
    assert_invalid_builder_result(result, SlotKind::HttpRequestVerifier);
}

#[test]
fn token_factory_builder_must_return_token_factory() {
    let result = PayumBuilder::new()
        .add_default_storages()
        .set_token_factory_builder(|storage, _| {
            let verifier: Arc<dyn HttpRequestVerifier> =
                Arc::new(PlainHttpRequestVerifier::new(storage));
            Component::HttpRequestVerifier(verifier)
        })
        .build();
    assert_invalid_builder_result(result, SlotKind::TokenFactory);
}

#[test]
fn generic_token_factory_builder_must_return_generic_factory() {
    let result = PayumBuilder::new()
        .add_default_storages()
        .set_generic_token_factory_builder(|tokens, _| Component::TokenFactory(tokens))
        .build();
    assert_invalid_builder_result(result, SlotKind::GenericTokenFactory);
}

#[test]
fn core_factory_builder_must_return_gateway_factory() {
    let result = PayumBuilder::new()
        .add_default_storages()
        .set_core_gateway_factory_builder(|_| Component::Storage(storage("x::Y")))
        .build();
    assert_invalid_builder_result(result, SlotKind::CoreGatewayFactory);
}

#[test]
fn token_storage_builder_must_return_storage() {
    let result = PayumBuilder::new()
        .set_token_storage_builder(|| {
            Component::GatewayFactory(Arc::new(CoreGatewayFactory::default()))
        })
        .build();
    assert_invalid_builder_result(result, SlotKind::TokenStorage);
}

// ============================================================================
// Generic token factory paths
// ============================================================================

#[test]
fn token_paths_round_trip() {
    let paths: IndexMap<String, String> = [
        ("capture", "pay/capture.html"),
        ("notify", "pay/notify.html"),
        ("authorize", "pay/authorize.html"),
        ("refund", "pay/refund.html"),
        ("payout", "pay/payout.html"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let payum = PayumBuilder::new()
        .add_default_storages()
        .set_generic_token_factory_paths(paths.clone())
        .build()
        .unwrap();

    assert_eq!(payum.generic_token_factory().paths().as_map(), &paths);
}

#[test]
fn partial_token_paths_keep_other_defaults() {
    let mut overrides = IndexMap::new();
    overrides.insert("notify".to_string(), "hooks/notify".to_string());

    let payum = PayumBuilder::new()
        .add_default_storages()
        .set_generic_token_factory_paths(overrides)
        .build()
        .unwrap();

    let paths = payum.generic_token_factory().paths();
    assert_eq!(paths.get("notify"), Some("hooks/notify"));
    assert_eq!(paths.get("capture"), Some("capture"));
}

// ============================================================================
// Catalog
// ============================================================================

#[test]
fn catalog_contains_documented_names() {
    let payum = PayumBuilder::new().add_default_storages().build().unwrap();

    for name in [
        "paypal_express_checkout",
        "paypal_masspay",
        "paypal_pro_checkout",
        "paypal_rest",
        "authorize_net_aim",
        "be2bill_direct",
        "be2bill_offsite",
        "klarna_checkout",
        "klarna_invoice",
        "offline",
        "payex",
        "stripe_checkout",
        "stripe_js",
        "core",
    ] {
        assert!(payum.catalog().contains(name), "missing factory {name}");
    }
    assert!(payum.catalog().len() >= 40);
    assert!(!payum.catalog().contains("omnipay"));
}

#[test]
fn omnipay_is_registered_with_bridge_capability() {
    let payum = PayumBuilder::new()
        .add_default_storages()
        .set_capabilities(Capabilities {
            omnipay_bridge: true,
        })
        .build()
        .unwrap();

    assert!(payum.catalog().contains("omnipay"));
}

#[test]
fn only_used_factories_are_instantiated() {
    let payum = PayumBuilder::new()
        .add_default_storages()
        .add_gateway_config("cash", GatewayConfig::new().with("factory", "offline"))
        .build()
        .unwrap();

    let catalog = payum.catalog();
    assert!(catalog.is_instantiated("offline"));
    assert!(!catalog.is_instantiated("stripe_js"));
    assert!(!catalog.is_instantiated("paypal_express_checkout"));
}

#[test]
fn builtin_factory_delegates_to_resolved_core() {
    let payum = PayumBuilder::new().add_default_storages().build().unwrap();
    let factory = ProviderGatewayFactory::new(
        &payum::factory::BUILTIN_FACTORIES[0],
        GatewayConfig::new(),
        Arc::clone(payum.core_gateway_factory()),
    );
    assert!(Arc::ptr_eq(
        factory.core_gateway_factory(),
        payum.core_gateway_factory()
    ));
}
