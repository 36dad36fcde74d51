//! Ordered registry of literal and deferred entries.

use super::deferred::Deferred;
use super::error::{ConfigError, ConfigResult};
use super::merge::MergePolicy;
use super::namespace::Namespace;
use super::value::Value;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use std::fmt;

/// Stored form of an entry.
#[derive(Debug, Clone)]
pub(crate) enum Entry {
    Literal(Value),
    Deferred(Deferred),
}

#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) namespace: Namespace,
    pub(crate) entry: Entry,
}

/// Ordered mapping from string key to a literal [`Value`] or a [`Deferred`]
/// computation.
///
/// Each key appears at most once. Writing an existing key replaces its value
/// and moves the key to the end: position reflects the *last* write.
///
/// Reads take `&self`; deferred entries memoize into their own slot, so a
/// shared registry can be handed to resolver functions.
#[derive(Clone, Default)]
pub struct ConfigRegistry {
    slots: IndexMap<String, Slot>,
}

impl ConfigRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a literal value, moving the key to the end.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.insert_entry(key.into(), Entry::Literal(value.into()));
        self
    }

    /// Set a deferred value, moving the key to the end.
    pub fn set_deferred<F>(&mut self, key: impl Into<String>, resolver: F) -> &mut Self
    where
        F: Fn(&ConfigRegistry) -> ConfigResult<Value> + Send + Sync + 'static,
    {
        self.insert_entry(key.into(), Entry::Deferred(Deferred::new(resolver)));
        self
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder form of [`set_deferred`](Self::set_deferred).
    pub fn with_deferred<F>(mut self, key: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&ConfigRegistry) -> ConfigResult<Value> + Send + Sync + 'static,
    {
        self.set_deferred(key, resolver);
        self
    }

    pub(crate) fn insert_entry(&mut self, key: String, entry: Entry) {
        let namespace = Namespace::classify(&key);
        self.slots.shift_remove(&key);
        self.slots.insert(key, Slot { namespace, entry });
    }

    pub(crate) fn take_slot(&mut self, key: &str) -> Option<Slot> {
        self.slots.shift_remove(key)
    }

    pub(crate) fn into_slots(self) -> impl Iterator<Item = (String, Slot)> {
        self.slots.into_iter()
    }

    /// Remove a key, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.slots.shift_remove(key).is_some()
    }

    /// Existence check; never triggers resolution.
    pub fn has(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Look up a key, resolving and memoizing a deferred entry.
    pub fn get(&self, key: &str) -> ConfigResult<Value> {
        let slot = self
            .slots
            .get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
        match &slot.entry {
            Entry::Literal(value) => Ok(value.clone()),
            Entry::Deferred(deferred) => deferred.resolve(key, self),
        }
    }

    /// Look up a key and deserialize its data payload.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<T> {
        self.get(key)?.to_typed(key)
    }

    /// Whether the key holds a deferred entry (resolved or not).
    pub fn is_deferred(&self, key: &str) -> bool {
        matches!(
            self.slots.get(key),
            Some(Slot {
                entry: Entry::Deferred(_),
                ..
            })
        )
    }

    /// Whether the key holds a deferred entry whose value is memoized.
    pub fn is_resolved(&self, key: &str) -> bool {
        match self.slots.get(key) {
            Some(Slot {
                entry: Entry::Deferred(deferred),
                ..
            }) => deferred.is_resolved(),
            _ => false,
        }
    }

    /// Namespace of a stored key.
    pub fn namespace_of(&self, key: &str) -> Option<Namespace> {
        self.slots.get(key).map(|slot| slot.namespace)
    }

    /// All keys in registry order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Keys starting with `prefix`, in registry order.
    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.keys().filter(move |key| key.starts_with(prefix))
    }

    /// Keys classified into `namespace`, in registry order.
    pub fn keys_in(&self, namespace: Namespace) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(move |(_, slot)| slot.namespace == namespace)
            .map(|(key, _)| key.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Force every deferred entry in registry order.
    pub fn resolve_all(&self) -> ConfigResult<()> {
        for (key, slot) in &self.slots {
            if let Entry::Deferred(deferred) = &slot.entry {
                deferred.resolve(key, self)?;
            }
        }
        Ok(())
    }

    /// Apply `overrides` on top of `self` with whole-value replacement.
    pub fn merge(self, overrides: ConfigRegistry) -> ConfigRegistry {
        self.merge_with(overrides, &MergePolicy::default())
    }

    /// Apply `overrides` on top of `self`, honouring `policy`'s additive keys.
    pub fn merge_with(mut self, overrides: ConfigRegistry, policy: &MergePolicy) -> ConfigRegistry {
        for (key, slot) in overrides.into_slots() {
            let entry = match self.take_slot(&key) {
                Some(base) if policy.is_additive(&key) => policy.combine(base.entry, slot.entry),
                _ => slot.entry,
            };
            self.insert_entry(key, entry);
        }
        self
    }

    /// Use `lower` as defaults under `self`.
    ///
    /// Keys already in `self` keep their value and position; missing keys
    /// are appended in `lower`'s order. Additive keys present on both sides
    /// are combined in place, with `self` winning per entry.
    pub fn fill_from(mut self, lower: ConfigRegistry, policy: &MergePolicy) -> ConfigRegistry {
        for (key, slot) in lower.into_slots() {
            match self.slots.get_mut(&key) {
                Some(upper) if policy.is_additive(&key) => {
                    let upper_entry = std::mem::replace(
                        &mut upper.entry,
                        Entry::Literal(Value::empty_list()),
                    );
                    upper.entry = policy.combine(slot.entry, upper_entry);
                }
                Some(_) => {}
                None => {
                    self.slots.insert(key, slot);
                }
            }
        }
        self
    }
}

impl fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(key, slot)| (key, &slot.entry)))
            .finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ConfigRegistry {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut registry = ConfigRegistry::new();
        for (key, value) in iter {
            registry.set(key, value);
        }
        registry
    }
}
