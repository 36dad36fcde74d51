use paygate_core::{
    CoreGatewayFactory, DEFAULT_LAYOUT, EndlessCycleDetectorExtension, GetHttpRequest, GetHttpRequestAction, HttpClient,
    RenderTemplate, ServerVars, TemplateEngine,
};
use paygate_kernel::config::{FileFormat, overrides_from_str, substitute_with};
use paygate_kernel::{
    ConfigError, ConfigRegistry, Extension, GatewayError, GatewayFactory, Value,
};
use paygate_testing::{HookEvent, MockAction, MockApi, MockExtension, TestRequest};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn factory() -> CoreGatewayFactory {
    paygate_testing::init_tracing();
    CoreGatewayFactory::new()
}

fn action_names(gateway: &paygate_kernel::Gateway) -> Vec<String> {
    gateway
        .actions()
        .iter()
        .map(|action| action.name().to_string())
        .collect()
}

fn position(names: &[String], name: &str) -> usize {
    names
        .iter()
        .position(|n| n == name)
        .unwrap_or_else(|| panic!("{name} not in {names:?}"))
}

#[test]
fn test_create_without_options_populates_every_list() {
    let gateway = factory().create(ConfigRegistry::new()).unwrap();

    assert!(!gateway.apis().is_empty());
    assert!(!gateway.actions().is_empty());
    assert!(!gateway.extensions().is_empty());
}

#[test]
fn test_custom_api_is_included() {
    let api = Arc::new(MockApi::new("custom"));
    let gateway = factory()
        .create(ConfigRegistry::new().with("api.custom", Value::shared(Arc::clone(&api))))
        .unwrap();

    assert!(
        gateway
            .apis()
            .iter()
            .any(|value| value.same_instance(&Value::shared(Arc::clone(&api))))
    );
    assert!(Arc::ptr_eq(&gateway.api::<MockApi>().unwrap(), &api));
}

#[test]
fn test_bare_api_key_is_an_api() {
    let api = Arc::new(MockApi::new("bare"));
    let gateway = factory()
        .create(ConfigRegistry::new().with("api", Value::shared(Arc::clone(&api))))
        .unwrap();

    assert_eq!(gateway.apis().len(), 2);
    assert_eq!(gateway.api::<MockApi>().unwrap().name(), "bare");
}

#[test]
fn test_default_http_client_is_shared() {
    let config = factory().create_config(ConfigRegistry::new()).unwrap();

    let api = config.get("api.http_client").unwrap();
    let alias = config.get("http_client").unwrap();
    assert!(api.downcast::<HttpClient>().is_some());
    assert!(api.same_instance(&alias));
    assert_eq!(api, alias);
}

#[test]
fn test_default_scalars() {
    let config = factory().create_config(ConfigRegistry::new()).unwrap();

    assert_eq!(
        config.get_as::<String>("template.layout").unwrap(),
        DEFAULT_LAYOUT
    );
    for key in [
        "prepend_actions",
        "prepend_extensions",
        "prepend_apis",
        "default_options",
        "required_options",
    ] {
        assert_eq!(config.get(key).unwrap(), Value::empty_list(), "{key}");
    }
}

#[test]
fn test_paths_merge_additively() {
    let config = factory()
        .create_config(ConfigRegistry::new().with("paths", json!({"Foo": "FooPath"})))
        .unwrap();

    let paths: BTreeMap<String, String> = config.get_as("paths").unwrap();
    assert_eq!(paths.get("Foo").map(String::as_str), Some("FooPath"));
    let core = std::path::Path::new(&paths["PaygateCore"]);
    assert!(core.ends_with("templates"));
    assert!(core.is_dir());
}

#[test]
fn test_constructor_defaults_propagate() {
    paygate_testing::init_tracing();
    let factory =
        CoreGatewayFactory::with_defaults(ConfigRegistry::new().with("foo", "fooVal"));

    let config = factory.create_config(ConfigRegistry::new()).unwrap();
    assert_eq!(config.get_as::<String>("foo").unwrap(), "fooVal");

    let config = factory
        .create_config(ConfigRegistry::new().with("foo", "barVal"))
        .unwrap();
    assert_eq!(config.get_as::<String>("foo").unwrap(), "barVal");
}

#[test]
fn test_prepend_actions() {
    let foo = MockAction::new("foo");
    let bar = MockAction::new("bar");
    let overrides = || {
        ConfigRegistry::new()
            .with("action.foo", Value::action(foo.clone()))
            .with("action.bar", Value::action(bar.clone()))
    };

    let gateway = factory().create(overrides()).unwrap();
    let names = action_names(&gateway);
    assert_eq!(&names[..2], ["foo", "bar"]);

    let mut request = TestRequest::new("capture");
    gateway.execute(&mut request).unwrap();
    assert_eq!(request.handled_by, vec!["foo"]);

    let gateway = factory()
        .create(overrides().with("prepend_actions", json!(["action.bar"])))
        .unwrap();
    let names = action_names(&gateway);
    assert_eq!(&names[..2], ["bar", "foo"]);
    assert_eq!(position(&names, "GetHttpRequestAction"), 2);

    gateway.execute(&mut TestRequest::new("capture")).unwrap();
    paygate_testing::assert_action_called!(foo, 1);
    paygate_testing::assert_action_called!(bar, 1);
}

#[test]
fn test_prepend_apis() {
    let overrides = || {
        ConfigRegistry::new()
            .with("api.foo", Value::service(MockApi::new("foo")))
            .with("api.bar", Value::service(MockApi::new("bar")))
    };
    let names = |gateway: &paygate_kernel::Gateway| -> Vec<String> {
        gateway
            .apis()
            .iter()
            .map(|api| match api.downcast::<MockApi>() {
                Some(api) => api.name().to_string(),
                None => "core".to_string(),
            })
            .collect()
    };

    let gateway = factory().create(overrides()).unwrap();
    assert_eq!(names(&gateway), vec!["foo", "bar", "core"]);

    let gateway = factory()
        .create(overrides().with("prepend_apis", json!(["api.bar"])))
        .unwrap();
    assert_eq!(names(&gateway), vec!["bar", "foo", "core"]);
    assert_eq!(gateway.api::<MockApi>().unwrap().name(), "bar");
    assert!(gateway.apis()[2].downcast::<HttpClient>().is_some());
}

#[test]
fn test_prepend_extensions() {
    // `bar` vetoes every execution, so `foo` only sees requests when it
    // runs before `bar`.
    let run = |prepend: Option<serde_json::Value>| {
        let foo = MockExtension::new("foo");
        let bar = MockExtension::new("bar").vetoing("stop");
        let mut overrides = ConfigRegistry::new()
            .with("extension.foo", Value::extension(foo.clone()))
            .with("extension.bar", Value::extension(bar.clone()));
        if let Some(prepend) = prepend {
            overrides.set("prepend_extensions", prepend);
        }
        let gateway = factory().create(overrides).unwrap();
        assert!(gateway.execute(&mut TestRequest::new("capture")).is_err());
        (foo.call_count(), bar.call_count())
    };

    assert_eq!(run(None), (1, 1));
    assert_eq!(run(Some(json!(["extension.bar"]))), (0, 1));

    let foo: Arc<dyn Extension> = Arc::new(MockExtension::new("foo"));
    let bar: Arc<dyn Extension> = Arc::new(MockExtension::new("bar"));
    let overrides = || {
        ConfigRegistry::new()
            .with("extension.foo", Value::Extension(Arc::clone(&foo)))
            .with("extension.bar", Value::Extension(Arc::clone(&bar)))
    };
    let order = |overrides: ConfigRegistry| -> Vec<&'static str> {
        let gateway = factory().create(overrides).unwrap();
        gateway
            .extensions()
            .extensions()
            .iter()
            .map(|extension| {
                if Arc::ptr_eq(extension, &foo) {
                    "foo"
                } else if Arc::ptr_eq(extension, &bar) {
                    "bar"
                } else {
                    "core"
                }
            })
            .collect()
    };

    assert_eq!(order(overrides()), vec!["foo", "bar", "core"]);
    assert_eq!(
        order(overrides().with("prepend_extensions", json!(["extension.bar"]))),
        vec!["bar", "foo", "core"]
    );
}

#[test]
fn test_independent_creates_build_distinct_gateways() {
    let factory = factory();
    let first = factory.create(ConfigRegistry::new()).unwrap();
    let second = factory.create(ConfigRegistry::new()).unwrap();

    assert!(!std::ptr::eq(&first, &second));
    assert_eq!(action_names(&first), action_names(&second));
    assert!(!Arc::ptr_eq(
        &first.api::<HttpClient>().unwrap(),
        &second.api::<HttpClient>().unwrap()
    ));
}

#[test]
fn test_cyclic_deferred_entries_fail() {
    let config = factory()
        .create_config(
            ConfigRegistry::new()
                .with_deferred("a", |config| config.get("b"))
                .with_deferred("b", |config| config.get("a")),
        )
        .unwrap();
    assert!(matches!(config.get("a"), Err(ConfigError::CyclicResolution(key)) if key == "a"));

    let err = factory()
        .create(ConfigRegistry::new().with_deferred("api.loop", |config| config.get("api.loop")))
        .unwrap_err();
    assert!(matches!(err, ConfigError::CyclicResolution(key) if key == "api.loop"));
}

#[test]
fn test_deferred_entries_are_memoized_per_registry() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let config = factory()
        .create_config(ConfigRegistry::new().with_deferred("api.counted", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::service(MockApi::new("counted")))
        }))
        .unwrap();

    let first = config.get("api.counted").unwrap();
    let second = config.get("api.counted").unwrap();
    assert!(first.same_instance(&second));
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let copy = config.clone();
    let third = copy.get("api.counted").unwrap();
    assert!(!third.same_instance(&first));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn test_missing_dependency_fails_create() {
    let err = factory()
        .create(ConfigRegistry::new().with_deferred("api.client", |config| config.get("api.key")))
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey(key) if key == "api.key"));
}

#[test]
fn test_extension_hooks_follow_nested_executions() {
    let extension = MockExtension::new("recorder");
    let gateway = factory()
        .create(
            ConfigRegistry::new()
                .with("action.nested", Value::action(MockAction::new("nested")))
                .with("extension.recorder", Value::extension(extension.clone())),
        )
        .unwrap();

    let mut request = TestRequest::nested("authorize", 1);
    gateway.execute(&mut request).unwrap();
    assert_eq!(request.handled_by, vec!["nested", "nested"]);

    assert_eq!(
        extension.events(),
        vec![
            HookEvent::PreExecute { request: "TestRequest".into(), depth: 1 },
            HookEvent::Execute { action: "nested".into(), depth: 1 },
            HookEvent::PreExecute { request: "TestRequest".into(), depth: 2 },
            HookEvent::Execute { action: "nested".into(), depth: 2 },
            HookEvent::PostExecute { depth: 2, failure: None },
            HookEvent::PostExecute { depth: 1, failure: None },
        ]
    );
}

#[test]
fn test_failed_action_reaches_post_hooks() {
    let action = MockAction::new("declined");
    action.fail_with("card declined");
    let extension = MockExtension::new("recorder");
    let gateway = factory()
        .create(
            ConfigRegistry::new()
                .with("action.declined", Value::action(action.clone()))
                .with("extension.recorder", Value::extension(extension.clone())),
        )
        .unwrap();

    let err = gateway.execute(&mut TestRequest::new("capture")).unwrap_err();
    assert!(matches!(err, GatewayError::ActionFailed { ref action, .. } if action == "declined"));
    assert!(matches!(
        extension.events().last(),
        Some(HookEvent::PostExecute { failure: Some(failure), .. }) if failure.contains("card declined")
    ));
}

#[test]
fn test_unsupported_request() {
    let gateway = factory()
        .create(
            ConfigRegistry::new()
                .with("action.refund", Value::action(MockAction::new("refund").supporting("refund"))),
        )
        .unwrap();

    let err = gateway.execute(&mut TestRequest::new("capture")).unwrap_err();
    assert!(matches!(err, GatewayError::RequestNotSupported(name) if name == "TestRequest"));
    gateway.execute(&mut TestRequest::new("refund-1")).unwrap();
}

#[test]
fn test_endless_cycle_is_detected() {
    let gateway = factory()
        .create(ConfigRegistry::new().with("action.loop", Value::action(MockAction::new("loop"))))
        .unwrap();

    let err = gateway
        .execute(&mut TestRequest::nested("loop", 1_000))
        .unwrap_err();
    assert!(matches!(err, GatewayError::EndlessCycle { limit: 100 }));
}

#[test]
fn test_render_template_with_custom_engine() {
    let mut engine = TemplateEngine::empty();
    engine
        .add_raw_template("@Acme/confirm.txt", "{{ layout }}: confirm {{ amount }}")
        .unwrap();

    let gateway = factory()
        .create(ConfigRegistry::new().with("template.env", Value::service(engine)))
        .unwrap();

    let mut request = RenderTemplate::new("@Acme/confirm.txt").with_parameter("amount", "9.99");
    gateway.execute(&mut request).unwrap();
    assert_eq!(
        request.result.as_deref(),
        Some("@PaygateCore/layout.html: confirm 9.99")
    );
}

#[test]
fn test_render_template_from_additional_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("done.html"),
        r#"{% extends "@PaygateCore/layout.html" %}{% block content %}Thanks, {{ name }}{% endblock content %}"#,
    )
    .unwrap();

    let gateway = factory()
        .create(ConfigRegistry::new().with(
            "paths",
            json!({"Shop": dir.path().to_string_lossy()}),
        ))
        .unwrap();

    let mut request = RenderTemplate::new("@Shop/done.html").with_parameter("name", "Ada");
    gateway.execute(&mut request).unwrap();
    let html = request.result.unwrap();
    assert!(html.contains("Thanks, Ada"));
    assert!(html.contains("<html>"));
}

#[test]
fn test_unparsable_template_in_additional_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "{% if %} broken").unwrap();
    std::fs::write(dir.path().join("thanks.txt"), "Thanks, {{ name }}").unwrap();

    let gateway = factory()
        .create(ConfigRegistry::new().with(
            "paths",
            json!({"Shop": dir.path().to_string_lossy()}),
        ))
        .unwrap();

    let mut request = RenderTemplate::new("@Shop/thanks.txt").with_parameter("name", "Ada");
    gateway.execute(&mut request).unwrap();
    assert_eq!(request.result.as_deref(), Some("Thanks, Ada"));

    let err = gateway
        .execute(&mut RenderTemplate::new("@Shop/notes.txt"))
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::ActionFailed { ref reason, .. } if reason.contains("@Shop/notes.txt")
    ));
}

#[test]
fn test_concurrent_executions_are_not_cycles() {
    // A tight limit: only two nested levels are allowed per call stack.
    let gateway = factory()
        .create(
            ConfigRegistry::new()
                .with("action.nested", Value::action(MockAction::new("nested")))
                .with(
                    "extension.endless_cycle_detector",
                    Value::extension(EndlessCycleDetectorExtension::new(2)),
                ),
        )
        .unwrap();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..50 {
                    let mut request = TestRequest::nested("capture", 1);
                    gateway.execute(&mut request).unwrap();
                    assert_eq!(request.handled_by, vec!["nested", "nested"]);
                }
            });
        }
    });

    let err = gateway
        .execute(&mut TestRequest::nested("capture", 2))
        .unwrap_err();
    assert!(matches!(err, GatewayError::EndlessCycle { limit: 2 }));
}

#[test]
fn test_get_http_request_override() {
    let vars: ServerVars = [
        ("REQUEST_METHOD", "GET"),
        ("HTTP_HOST", "shop.example.com"),
        ("REQUEST_URI", "/return?token=t1"),
    ]
    .into_iter()
    .collect();
    let gateway = factory()
        .create(ConfigRegistry::new().with(
            "action.get_http_request",
            Value::action(GetHttpRequestAction::with_vars(vars)),
        ))
        .unwrap();

    let mut request = GetHttpRequest::new();
    gateway.execute(&mut request).unwrap();
    assert_eq!(request.uri, "http://shop.example.com/return?token=t1");
    assert_eq!(request.query["token"], "t1");
}

#[test]
fn test_overrides_from_document() {
    let vars = HashMap::from([("ACME_TEMPLATES".to_string(), "/srv/acme".to_string())]);
    let document = substitute_with(
        r#"
sandbox: true
template.layout: "@Acme/layout.html"
paths:
  Acme: ${ACME_TEMPLATES}
required_options: [sandbox]
"#,
        &vars,
    );
    let overrides = overrides_from_str(&document, FileFormat::Yaml).unwrap();

    let factory = factory();
    let config = factory.create_config(overrides.clone()).unwrap();
    assert_eq!(config.get("sandbox").unwrap(), Value::data(true));
    assert_eq!(
        config.get_as::<String>("template.layout").unwrap(),
        "@Acme/layout.html"
    );
    let paths: BTreeMap<String, String> = config.get_as("paths").unwrap();
    assert_eq!(paths["Acme"], "/srv/acme");
    assert!(paths.contains_key("PaygateCore"));

    factory.create(overrides).unwrap();
}

#[test]
fn test_required_options_are_enforced() {
    let err = factory()
        .create(ConfigRegistry::new().with("required_options", json!(["username"])))
        .unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey(key) if key == "username"));
}
