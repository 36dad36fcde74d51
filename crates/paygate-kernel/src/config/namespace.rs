//! Key namespaces.
//!
//! Keys are plain strings; the namespace is encoded by a dot-separated prefix.
//! The bare namespace name (`api`, `action`, `extension`) belongs to the
//! namespace too, so `create({"api": x})` contributes `x` to the apis list.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a registry key, computed once when the key is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    /// `api.*`: capability providers.
    Api,
    /// `action.*`: request handlers.
    Action,
    /// `extension.*`: cross-cutting hooks.
    Extension,
    /// Anything else; left as scalar config.
    Scalar,
}

impl Namespace {
    /// The three namespaces the extractor turns into ordered lists.
    pub const COLLECTIONS: [Namespace; 3] = [Namespace::Api, Namespace::Action, Namespace::Extension];

    /// Classify a key by its prefix.
    pub fn classify(key: &str) -> Self {
        Self::COLLECTIONS
            .into_iter()
            .find(|ns| ns.contains(key))
            .unwrap_or(Namespace::Scalar)
    }

    /// Whether `key` lives in this namespace.
    pub fn contains(self, key: &str) -> bool {
        match self.name() {
            Some(name) => key
                .strip_prefix(name)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.')),
            None => Self::classify(key) == Namespace::Scalar,
        }
    }

    /// Bare namespace name, `None` for scalars.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Namespace::Api => Some("api"),
            Namespace::Action => Some("action"),
            Namespace::Extension => Some("extension"),
            Namespace::Scalar => None,
        }
    }

    /// Key prefix including the trailing dot (`"api."`), `None` for scalars.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Namespace::Api => Some("api."),
            Namespace::Action => Some("action."),
            Namespace::Extension => Some("extension."),
            Namespace::Scalar => None,
        }
    }

    /// Key of the prepend directive that reorders this namespace.
    pub fn prepend_directive(self) -> Option<&'static str> {
        match self {
            Namespace::Api => Some("prepend_apis"),
            Namespace::Action => Some("prepend_actions"),
            Namespace::Extension => Some("prepend_extensions"),
            Namespace::Scalar => None,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name().unwrap_or("scalar"))
    }
}
