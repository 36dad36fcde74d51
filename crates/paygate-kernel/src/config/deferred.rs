//! Deferred (lazily computed) registry entries.
//!
//! A [`Deferred`] wraps a resolver `f(&ConfigRegistry) -> Value`. The
//! resolver runs on first lookup and its result is memoized in the entry's
//! own slot; later lookups return the cached value even if the registry was
//! mutated in between. Resolvers may read other keys, which resolves them
//! depth-first. A key requested while its own resolution is still running
//! fails with [`ConfigError::CyclicResolution`].

use super::error::{ConfigError, ConfigResult};
use super::registry::ConfigRegistry;
use super::value::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Resolver function of a deferred entry.
pub type Resolver = Arc<dyn Fn(&ConfigRegistry) -> ConfigResult<Value> + Send + Sync>;

#[derive(Debug, Clone)]
enum State {
    Pending,
    Resolving,
    Resolved(Value),
}

/// A computation evaluated at most once per registry, on first access.
pub struct Deferred {
    resolver: Resolver,
    state: Mutex<State>,
}

impl Deferred {
    /// Wrap a resolver function.
    pub fn new<F>(resolver: F) -> Self
    where
        F: Fn(&ConfigRegistry) -> ConfigResult<Value> + Send + Sync + 'static,
    {
        Self::from_resolver(Arc::new(resolver))
    }

    /// Wrap an already shared resolver.
    pub fn from_resolver(resolver: Resolver) -> Self {
        Self {
            resolver,
            state: Mutex::new(State::Pending),
        }
    }

    /// Whether the memoized value is available.
    pub fn is_resolved(&self) -> bool {
        matches!(*self.state.lock(), State::Resolved(_))
    }

    /// Return the memoized value, running the resolver on first call.
    ///
    /// The lock is released while the resolver runs so it can read other
    /// deferred entries. A failed resolution is not memoized.
    pub fn resolve(&self, key: &str, registry: &ConfigRegistry) -> ConfigResult<Value> {
        {
            let mut state = self.state.lock();
            match &*state {
                State::Resolved(value) => return Ok(value.clone()),
                State::Resolving => return Err(ConfigError::CyclicResolution(key.to_string())),
                State::Pending => *state = State::Resolving,
            }
        }

        trace!(key, "resolving deferred config entry");
        let outcome = (self.resolver)(registry);

        let mut state = self.state.lock();
        match outcome {
            Ok(value) => {
                *state = State::Resolved(value.clone());
                Ok(value)
            }
            Err(err) => {
                *state = State::Pending;
                Err(err)
            }
        }
    }
}

/// Clones share the resolver but start unresolved: memoization is scoped to
/// one registry instance.
impl Clone for Deferred {
    fn clone(&self) -> Self {
        Self::from_resolver(Arc::clone(&self.resolver))
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}
