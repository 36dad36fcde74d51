//! The assembled gateway and its execution loop.

use super::assemble::ScalarConfig;
use super::error::{GatewayError, GatewayResult};
use super::extension::{Context, Extension, ExtensionChain};
use super::request::{Action, Request};
use crate::config::Value;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_GATEWAY_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Execution depth of each gateway on this thread's call stack.
    static DEPTHS: RefCell<HashMap<u64, usize>> = RefCell::new(HashMap::new());
}

/// The assembled runtime object.
///
/// A gateway is built once per factory `create` call and never shared
/// between calls. Its lists are fixed; [`execute`](Gateway::execute) may be
/// called re-entrantly by actions, and concurrently from several threads:
/// depth is counted per thread.
pub struct Gateway {
    apis: Vec<Value>,
    actions: Vec<Arc<dyn Action>>,
    extensions: ExtensionChain,
    config: ScalarConfig,
    id: u64,
}

/// Holds one level of execution depth until the execute call unwinds.
struct DepthGuard {
    gateway: u64,
    depth: usize,
}

impl DepthGuard {
    fn enter(gateway: u64) -> Self {
        let depth = DEPTHS.with(|depths| {
            let mut depths = depths.borrow_mut();
            let depth = depths.entry(gateway).or_insert(0);
            *depth += 1;
            *depth
        });
        Self { gateway, depth }
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTHS.with(|depths| {
            let mut depths = depths.borrow_mut();
            if let Some(depth) = depths.get_mut(&self.gateway) {
                *depth -= 1;
                if *depth == 0 {
                    depths.remove(&self.gateway);
                }
            }
        });
    }
}

impl Gateway {
    pub(crate) fn new(
        apis: Vec<Value>,
        actions: Vec<Arc<dyn Action>>,
        extensions: ExtensionChain,
        config: ScalarConfig,
    ) -> Self {
        Self {
            apis,
            actions,
            extensions,
            config,
            id: NEXT_GATEWAY_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Capability providers, in extraction order.
    pub fn apis(&self) -> &[Value] {
        &self.apis
    }

    /// Request handlers, in extraction order.
    pub fn actions(&self) -> &[Arc<dyn Action>] {
        &self.actions
    }

    /// The extension chain.
    pub fn extensions(&self) -> &ExtensionChain {
        &self.extensions
    }

    /// Pass-through access to the non-namespaced config.
    pub fn config(&self) -> &ScalarConfig {
        &self.config
    }

    /// First api that is a `T` service.
    pub fn api<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.apis.iter().find_map(Value::downcast::<T>)
    }

    /// Execute `request` through the extension chain and the first action
    /// that supports it.
    pub fn execute(&self, request: &mut dyn Request) -> GatewayResult<()> {
        let guard = DepthGuard::enter(self.id);
        let depth = guard.depth;

        let name = (*request).request_name();
        let mut context = Context::new(request, depth);
        let outcome = self.run(&mut context);
        if let Err(err) = &outcome {
            debug!(request = name, depth, error = %err, "execution failed");
            context.set_failure(err.to_string());
        }

        let post = self.extensions.on_post_execute(&mut context);
        outcome.and(post)
    }

    fn run(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        self.extensions.on_pre_execute(context)?;

        if context.action().is_none() {
            let action = self
                .actions
                .iter()
                .find(|action| action.supports(context.request()))
                .cloned()
                .ok_or_else(|| {
                    GatewayError::RequestNotSupported(context.request().request_name().to_string())
                })?;
            context.set_action(action);
        }

        self.extensions.on_execute(context)?;

        let depth = context.depth();
        let (request, action) = context.parts();
        let Some(action) = action else {
            return Err(GatewayError::RequestNotSupported(
                (*request).request_name().to_string(),
            ));
        };
        debug!(
            request = (*request).request_name(),
            action = action.name(),
            depth,
            "executing request"
        );
        action.execute(request, self)
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("apis", &self.apis)
            .field(
                "actions",
                &self.actions.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field("extensions", &self.extensions)
            .field("config", &self.config)
            .finish()
    }
}
