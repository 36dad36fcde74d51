//! Gateway assembly.

use super::extension::{Extension, ExtensionChain};
use super::request::Action;
use super::runtime::Gateway;
use crate::config::{
    ConfigError, ConfigRegistry, ConfigResult, Namespace, Value, ValueKind, extract,
};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Read-only view of a gateway's non-namespaced config.
///
/// Wraps the registry the gateway was built from; deferred scalars that
/// were not consumed during assembly resolve on first read.
#[derive(Clone, Default)]
pub struct ScalarConfig {
    registry: Arc<ConfigRegistry>,
}

impl ScalarConfig {
    /// Wrap a registry.
    pub fn new(registry: ConfigRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Look up a scalar key.
    ///
    /// Namespaced keys (`api.*`, `action.*`, `extension.*`) are not part of
    /// the view and report [`ConfigError::MissingKey`].
    pub fn get(&self, key: &str) -> ConfigResult<Value> {
        if Namespace::classify(key) != Namespace::Scalar {
            return Err(ConfigError::MissingKey(key.to_string()));
        }
        self.registry.get(key)
    }

    /// Look up a scalar key and deserialize its data payload.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<T> {
        self.get(key)?.to_typed(key)
    }

    /// Whether the scalar key exists.
    pub fn has(&self, key: &str) -> bool {
        Namespace::classify(key) == Namespace::Scalar && self.registry.has(key)
    }

    /// Scalar keys, in registry order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.registry.keys_in(Namespace::Scalar)
    }
}

impl fmt::Debug for ScalarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

/// Build a gateway from already extracted lists. Performs no validation.
pub fn assemble(
    apis: Vec<Value>,
    actions: Vec<Arc<dyn Action>>,
    extensions: Vec<Arc<dyn Extension>>,
    config: ScalarConfig,
) -> Gateway {
    Gateway::new(apis, actions, ExtensionChain::new(extensions), config)
}

fn unexpected(key: String, expected: ValueKind, found: &Value) -> ConfigError {
    ConfigError::UnexpectedKind {
        key,
        expected: expected.as_str(),
        found: found.kind().as_str(),
    }
}

/// Extract apis, actions and extensions from `registry` and assemble them.
///
/// The registry itself becomes the gateway's [`ScalarConfig`].
pub fn build_gateway(registry: ConfigRegistry) -> ConfigResult<Gateway> {
    let apis: Vec<Value> = extract(&registry, Namespace::Api)?
        .into_iter()
        .map(|(_, value)| value)
        .collect();

    let actions = extract(&registry, Namespace::Action)?
        .into_iter()
        .map(|(key, value)| match value {
            Value::Action(action) => Ok(action),
            other => Err(unexpected(key, ValueKind::Action, &other)),
        })
        .collect::<ConfigResult<Vec<_>>>()?;

    let extensions = extract(&registry, Namespace::Extension)?
        .into_iter()
        .map(|(key, value)| match value {
            Value::Extension(extension) => Ok(extension),
            other => Err(unexpected(key, ValueKind::Extension, &other)),
        })
        .collect::<ConfigResult<Vec<_>>>()?;

    debug!(
        apis = apis.len(),
        actions = actions.len(),
        extensions = extensions.len(),
        "assembled gateway"
    );
    Ok(assemble(apis, actions, extensions, ScalarConfig::new(registry)))
}
