//! Namespace extraction with prepend ordering.
//!
//! Extraction runs in two passes: collect the namespace's keys in registry
//! order (resolving each entry), then stably partition them by membership in
//! the prepend directive. The output depends only on key insertion order and
//! directive contents.

use super::error::ConfigResult;
use super::namespace::Namespace;
use super::registry::ConfigRegistry;
use super::value::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Reorder `keys` so that every key named in `directive` comes first, in
/// directive order, followed by the rest in their original order.
///
/// Directive entries absent from `keys` are ignored; a key listed twice is
/// placed at its first listed position.
pub fn prepend_order(keys: Vec<String>, directive: &[String]) -> Vec<String> {
    let present: HashSet<&str> = keys.iter().map(String::as_str).collect();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut front = Vec::new();
    for key in directive {
        if !present.contains(key.as_str()) {
            debug!(key = %key, "prepend directive names an unknown key; ignoring");
            continue;
        }
        if placed.insert(key.as_str()) {
            front.push(key.clone());
        }
    }

    let rest: Vec<String> = keys
        .iter()
        .filter(|key| !placed.contains(key.as_str()))
        .cloned()
        .collect();
    front.extend(rest);
    front
}

fn read_directive(registry: &ConfigRegistry, directive_key: &str) -> ConfigResult<Vec<String>> {
    if registry.has(directive_key) {
        registry.get_as(directive_key)
    } else {
        Ok(Vec::new())
    }
}

fn resolve_ordered(
    registry: &ConfigRegistry,
    keys: Vec<String>,
    directive_key: &str,
) -> ConfigResult<Vec<(String, Value)>> {
    let mut resolved = HashMap::with_capacity(keys.len());
    for key in &keys {
        resolved.insert(key.clone(), registry.get(key)?);
    }

    let directive = read_directive(registry, directive_key)?;
    Ok(prepend_order(keys, &directive)
        .into_iter()
        .filter_map(|key| resolved.remove(&key).map(|value| (key, value)))
        .collect())
}

/// Extract a collection namespace as ordered `(key, value)` pairs.
///
/// Deferred entries are resolved; the namespace's prepend directive (if
/// present) moves the keys it names to the front. [`Namespace::Scalar`]
/// yields the scalar keys in registry order.
pub fn extract(registry: &ConfigRegistry, namespace: Namespace) -> ConfigResult<Vec<(String, Value)>> {
    let keys: Vec<String> = registry.keys_in(namespace).map(str::to_string).collect();
    match namespace.prepend_directive() {
        Some(directive_key) => resolve_ordered(registry, keys, directive_key),
        None => keys
            .into_iter()
            .map(|key| registry.get(&key).map(|value| (key, value)))
            .collect(),
    }
}

/// String-keyed form of [`extract`]: keys starting with `prefix`, reordered
/// by the list stored under `directive_key`.
pub fn extract_with(
    registry: &ConfigRegistry,
    prefix: &str,
    directive_key: &str,
) -> ConfigResult<Vec<(String, Value)>> {
    let keys: Vec<String> = registry.keys_with_prefix(prefix).map(str::to_string).collect();
    resolve_ordered(registry, keys, directive_key)
}

/// [`extract`] with the keys discarded.
pub fn extract_values(registry: &ConfigRegistry, namespace: Namespace) -> ConfigResult<Vec<Value>> {
    Ok(extract(registry, namespace)?
        .into_iter()
        .map(|(_, value)| value)
        .collect())
}
