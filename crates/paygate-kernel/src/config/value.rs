//! Literal registry values.

use crate::gateway::{Action, Extension};
use serde::de::DeserializeOwned;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Kind tag of a [`Value`], used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Plain data.
    Data,
    /// Opaque shared object.
    Service,
    /// Request handler.
    Action,
    /// Execution hook.
    Extension,
}

impl ValueKind {
    /// Lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Data => "data",
            ValueKind::Service => "a service",
            ValueKind::Action => "an action",
            ValueKind::Extension => "an extension",
        }
    }
}

/// A resolved registry value.
///
/// `Data` compares structurally; every other variant compares by instance,
/// so two lookups of a shared service are equal only if they return the same
/// `Arc`.
#[derive(Clone)]
pub enum Value {
    /// Plain data: strings, key lists, path maps, numbers.
    Data(serde_json::Value),
    /// An opaque shared object (HTTP client, template engine, custom api).
    Service(Arc<dyn Any + Send + Sync>),
    /// A request handler.
    Action(Arc<dyn Action>),
    /// An execution hook.
    Extension(Arc<dyn Extension>),
}

impl Value {
    /// Wrap plain data.
    pub fn data(value: impl Into<serde_json::Value>) -> Self {
        Value::Data(value.into())
    }

    /// Wrap an owned object as a shared service.
    pub fn service<T: Any + Send + Sync>(service: T) -> Self {
        Value::Service(Arc::new(service))
    }

    /// Wrap an already shared object without re-allocating it.
    pub fn shared<T: Any + Send + Sync>(service: Arc<T>) -> Self {
        Value::Service(service)
    }

    /// Wrap an action.
    pub fn action<A: Action + 'static>(action: A) -> Self {
        Value::Action(Arc::new(action))
    }

    /// Wrap an extension.
    pub fn extension<E: Extension + 'static>(extension: E) -> Self {
        Value::Extension(Arc::new(extension))
    }

    /// An empty data list, the neutral value of every directive.
    pub fn empty_list() -> Self {
        Value::Data(serde_json::Value::Array(Vec::new()))
    }

    /// Kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Data(_) => ValueKind::Data,
            Value::Service(_) => ValueKind::Service,
            Value::Action(_) => ValueKind::Action,
            Value::Extension(_) => ValueKind::Extension,
        }
    }

    /// Borrow the data payload.
    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Data(data) => Some(data),
            _ => None,
        }
    }

    /// Borrow a string payload.
    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(serde_json::Value::as_str)
    }

    /// Deserialize the data payload into `T`.
    ///
    /// `key` is only used to label the error.
    pub fn to_typed<T: DeserializeOwned>(&self, key: &str) -> crate::config::ConfigResult<T> {
        let data = self.as_data().ok_or_else(|| crate::config::ConfigError::UnexpectedKind {
            key: key.to_string(),
            expected: ValueKind::Data.as_str(),
            found: self.kind().as_str(),
        })?;
        serde_json::from_value(data.clone()).map_err(|e| crate::config::ConfigError::invalid(key, e))
    }

    /// Downcast a service to its concrete type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Value::Service(service) => Arc::clone(service).downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Borrow the action payload.
    pub fn as_action(&self) -> Option<&Arc<dyn Action>> {
        match self {
            Value::Action(action) => Some(action),
            _ => None,
        }
    }

    /// Borrow the extension payload.
    pub fn as_extension(&self) -> Option<&Arc<dyn Extension>> {
        match self {
            Value::Extension(extension) => Some(extension),
            _ => None,
        }
    }

    /// Whether the value is "empty" data: `null`, `""`, `[]` or `{}`.
    pub fn is_empty_data(&self) -> bool {
        match self {
            Value::Data(serde_json::Value::Null) => true,
            Value::Data(serde_json::Value::String(s)) => s.is_empty(),
            Value::Data(serde_json::Value::Array(items)) => items.is_empty(),
            Value::Data(serde_json::Value::Object(map)) => map.is_empty(),
            _ => false,
        }
    }

    /// Whether both values hold the same shared instance.
    ///
    /// Always `false` for data.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Service(a), Value::Service(b)) => Arc::ptr_eq(a, b),
            (Value::Action(a), Value::Action(b)) => Arc::ptr_eq(a, b),
            (Value::Extension(a), Value::Extension(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Data(a), Value::Data(b)) => a == b,
            _ => self.same_instance(other),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Data(data) => f.debug_tuple("Data").field(data).finish(),
            Value::Service(_) => f.write_str("Service(..)"),
            Value::Action(action) => f.debug_tuple("Action").field(&action.name()).finish(),
            Value::Extension(_) => f.write_str("Extension(..)"),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Data(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Data(serde_json::Value::String(value.to_string()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Data(serde_json::Value::String(value))
    }
}

impl From<Arc<dyn Action>> for Value {
    fn from(action: Arc<dyn Action>) -> Self {
        Value::Action(action)
    }
}

impl From<Arc<dyn Extension>> for Value {
    fn from(extension: Arc<dyn Extension>) -> Self {
        Value::Extension(extension)
    }
}
