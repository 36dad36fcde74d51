//! Layered merging of registries.

use super::registry::{ConfigRegistry, Entry};
use super::value::Value;
use std::collections::BTreeSet;

/// Per-key merge rules applied on top of whole-value replacement.
///
/// Keys marked additive merge object entries instead of replacing the whole
/// map: `{"A": 1}` under `{"B": 2}` yields `{"A": 1, "B": 2}`, with the
/// upper layer winning per entry. If either side is not a literal JSON
/// object, the upper value replaces the lower one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePolicy {
    additive: BTreeSet<String>,
}

impl MergePolicy {
    /// Policy with no additive keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as additive.
    pub fn with_additive(mut self, key: impl Into<String>) -> Self {
        self.additive.insert(key.into());
        self
    }

    /// Whether `key` merges additively.
    pub fn is_additive(&self, key: &str) -> bool {
        self.additive.contains(key)
    }

    pub(crate) fn combine(&self, base: Entry, upper: Entry) -> Entry {
        match (base, upper) {
            (
                Entry::Literal(Value::Data(serde_json::Value::Object(mut lower))),
                Entry::Literal(Value::Data(serde_json::Value::Object(higher))),
            ) => {
                lower.extend(higher);
                Entry::Literal(Value::Data(serde_json::Value::Object(lower)))
            }
            (_, upper) => upper,
        }
    }
}

/// Merge `layers` low → high into one registry.
///
/// Every key of every layer is present in the result; a key written by a
/// higher layer takes that layer's value and its position.
pub fn layered_merge<I>(layers: I, policy: &MergePolicy) -> ConfigRegistry
where
    I: IntoIterator<Item = ConfigRegistry>,
{
    layers
        .into_iter()
        .fold(ConfigRegistry::new(), |merged, layer| {
            merged.merge_with(layer, policy)
        })
}

/// Merge `layers` low → high, keeping the highest layer's keys first.
///
/// Values resolve as in [`layered_merge`], but key order is the reverse of
/// precedence: keys of the highest layer come first in their own order,
/// followed by keys only a lower layer defines. Caller-supplied entries
/// thereby sort ahead of built-ins.
pub fn layered_defaults<I>(layers: I, policy: &MergePolicy) -> ConfigRegistry
where
    I: IntoIterator<Item = ConfigRegistry>,
    I::IntoIter: DoubleEndedIterator,
{
    layers
        .into_iter()
        .rev()
        .fold(ConfigRegistry::new(), |merged, layer| {
            merged.fill_from(layer, policy)
        })
}
