//! The core gateway factory.
//!
//! Config is merged in three layers, lowest precedence first:
//!
//! 1. built-ins ([`CoreGatewayFactory::builtins`])
//! 2. factory defaults given to [`CoreGatewayFactory::with_defaults`]
//! 3. per-call overrides
//!
//! `paths` is additive across layers; every other key is replaced by the
//! higher layer. Keys are ordered top-down: override keys first, then keys
//! only the defaults define, then the remaining built-ins, so caller actions,
//! apis and extensions sort ahead of the core ones.

use crate::action::{GetHttpRequestAction, RenderTemplateAction};
use crate::extension::EndlessCycleDetectorExtension;
use crate::http::HttpClient;
use crate::template::TemplateEngine;
use paygate_kernel::config::ConfigReport;
use paygate_kernel::{
    ConfigError, ConfigRegistry, ConfigResult, Gateway, GatewayFactory, MergePolicy, Value,
    build_gateway, layered_defaults,
};
use serde_json::{Value as JsonValue, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Template namespace of the bundled templates.
pub const CORE_NAMESPACE: &str = "PaygateCore";

/// Layout handed to every rendered template.
pub const DEFAULT_LAYOUT: &str = "@PaygateCore/layout.html";

/// Options merged into the config when absent.
pub const DEFAULT_OPTIONS: &str = "default_options";

/// Keys that must be present and non-empty for [`GatewayFactory::create`].
pub const REQUIRED_OPTIONS: &str = "required_options";

/// Directory holding the bundled templates.
pub fn templates_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}

/// Factory for gateways wired with the core built-ins.
#[derive(Debug, Clone, Default)]
pub struct CoreGatewayFactory {
    defaults: ConfigRegistry,
}

impl CoreGatewayFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose `defaults` sit between the built-ins and per-call
    /// overrides.
    pub fn with_defaults(defaults: ConfigRegistry) -> Self {
        Self { defaults }
    }

    /// Factory whose defaults are loaded from a TOML, YAML or JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigReport<Self> {
        paygate_kernel::config::load_overrides(path).map(Self::with_defaults)
    }

    pub fn defaults(&self) -> &ConfigRegistry {
        &self.defaults
    }

    /// Merge policy used by [`create_config`](GatewayFactory::create_config).
    pub fn merge_policy() -> MergePolicy {
        MergePolicy::new().with_additive("paths")
    }

    /// The built-in entries, in registration order.
    pub fn builtins() -> ConfigRegistry {
        let mut config = ConfigRegistry::new();
        config
            .set("template.layout", DEFAULT_LAYOUT)
            .set(
                "paths",
                json!({ CORE_NAMESPACE: templates_dir().to_string_lossy() }),
            )
            .set_deferred("template.env", |config| {
                let paths: BTreeMap<String, PathBuf> = config.get_as("paths")?;
                Ok(Value::service(TemplateEngine::from_paths(paths)))
            })
            .set_deferred("api.http_client", |_| Ok(Value::service(HttpClient::new())))
            .set_deferred("http_client", |config| config.get("api.http_client"))
            .set(
                "action.get_http_request",
                Value::action(GetHttpRequestAction::new()),
            )
            .set_deferred("action.render_template", |config| {
                let env = config.get("template.env")?;
                let engine = env.downcast::<TemplateEngine>().ok_or_else(|| {
                    ConfigError::UnexpectedKind {
                        key: "template.env".to_string(),
                        expected: "a template engine",
                        found: env.kind().as_str(),
                    }
                })?;
                let layout: String = config.get_as("template.layout")?;
                Ok(Value::action(RenderTemplateAction::new(engine, layout)))
            })
            .set(
                "extension.endless_cycle_detector",
                Value::extension(EndlessCycleDetectorExtension::default()),
            )
            .set("prepend_actions", Value::empty_list())
            .set("prepend_extensions", Value::empty_list())
            .set("prepend_apis", Value::empty_list())
            .set(DEFAULT_OPTIONS, Value::empty_list())
            .set(REQUIRED_OPTIONS, Value::empty_list());
        config
    }
}

/// Copy every `default_options` entry whose key is not yet set.
fn apply_default_options(config: &mut ConfigRegistry) -> ConfigResult<()> {
    if !config.has(DEFAULT_OPTIONS) {
        return Ok(());
    }
    let options = config.get(DEFAULT_OPTIONS)?;
    match options.as_data() {
        Some(JsonValue::Object(options)) => {
            for (key, value) in options {
                if !config.has(key) {
                    debug!(key = %key, "applying default option");
                    config.set(key.clone(), value.clone());
                }
            }
            Ok(())
        }
        _ if options.is_empty_data() => Ok(()),
        _ => Err(ConfigError::invalid(
            DEFAULT_OPTIONS,
            "expected a mapping of option names to defaults",
        )),
    }
}

/// Fail with [`ConfigError::MissingKey`] for the first required option that
/// is absent or empty.
fn check_required_options(config: &ConfigRegistry) -> ConfigResult<()> {
    if !config.has(REQUIRED_OPTIONS) {
        return Ok(());
    }
    let required: Vec<String> = config.get_as(REQUIRED_OPTIONS)?;
    for key in required {
        if !config.has(&key) || config.get(&key)?.is_empty_data() {
            return Err(ConfigError::MissingKey(key));
        }
    }
    Ok(())
}

impl GatewayFactory for CoreGatewayFactory {
    fn create_config(&self, overrides: ConfigRegistry) -> ConfigResult<ConfigRegistry> {
        let mut config = layered_defaults(
            [Self::builtins(), self.defaults.clone(), overrides],
            &Self::merge_policy(),
        );
        apply_default_options(&mut config)?;
        Ok(config)
    }

    fn create(&self, overrides: ConfigRegistry) -> ConfigResult<Gateway> {
        let config = self.create_config(overrides)?;
        check_required_options(&config)?;
        build_gateway(config)
    }
}
