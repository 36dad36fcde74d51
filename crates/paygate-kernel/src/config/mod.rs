//! Configuration registry.
//!
//! A [`ConfigRegistry`] is an ordered mapping from string keys to either a
//! literal [`Value`] or a [`Deferred`] computation. Keys are classified into a
//! [`Namespace`] by prefix (`api.`, `action.`, `extension.`) when written, and
//! the [`extract`] pass turns each namespace into an ordered list honouring
//! the matching `prepend_*` directive.
//!
//! ## Precedence
//!
//! Layers are merged low → high with [`layered_merge`]: a later layer
//! replaces a key's value *and* moves the key to its own insertion position.
//! Keys named in a [`MergePolicy`] are merged additively instead (map entries
//! are added, not replaced wholesale).
//!
//! [`layered_defaults`] resolves the same values but orders keys top-down:
//! the highest layer's keys first, then keys only lower layers define.
//!
//! ## Override documents
//!
//! [`loader`] reads TOML, YAML or JSON override documents with `${VAR}`
//! substitution.

pub mod deferred;
pub mod error;
pub mod extract;
pub mod loader;
pub mod merge;
pub mod namespace;
pub mod registry;
pub mod value;

pub use deferred::Deferred;
pub use error::{ConfigError, ConfigReport, ConfigResult, IntoConfigReport};
pub use extract::{extract, extract_values, extract_with, prepend_order};
pub use loader::{
    FileFormat, detect_format, load_overrides, overrides_from_str, substitute_env_vars,
    substitute_with,
};
pub use merge::{MergePolicy, layered_defaults, layered_merge};
pub use namespace::Namespace;
pub use registry::ConfigRegistry;
pub use value::{Value, ValueKind};
