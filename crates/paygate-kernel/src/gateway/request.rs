//! Requests and the action contract.

use super::Gateway;
use super::error::GatewayResult;
use std::any::{Any, type_name};
use std::fmt;

/// Anything a gateway can execute.
///
/// Implemented for every `'static + Send + Debug` type; actions downcast the
/// request to the concrete types they handle.
pub trait Request: Any + Send + fmt::Debug {
    /// Type name used in logs and errors.
    fn request_name(&self) -> &'static str;

    /// Upcast for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Send + fmt::Debug> Request for T {
    fn request_name(&self) -> &'static str {
        short_type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn Request {
    /// Whether the request is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow the request as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow the request as a `T`.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Last path segment of a type name (`paygate_core::GetHttpRequest` → `GetHttpRequest`).
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A request handler.
///
/// The gateway hands each request to the first action (in list order) whose
/// [`supports`](Action::supports) returns `true`. Actions may execute nested
/// requests through the `gateway` argument and look up apis with
/// [`Gateway::api`].
pub trait Action: Send + Sync {
    /// Stable, human-readable identifier (used in logs).
    fn name(&self) -> &str {
        short_type_name::<Self>()
    }

    /// Whether this action can handle `request`.
    fn supports(&self, request: &dyn Request) -> bool;

    /// Handle `request`.
    fn execute(&self, request: &mut dyn Request, gateway: &Gateway) -> GatewayResult<()>;
}
