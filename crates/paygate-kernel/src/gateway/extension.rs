//! Extension hooks and the extension chain.
//!
//! Extensions observe every execution. The chain calls each hook on every
//! extension in list order and stops at the first error:
//!
//! ```text
//! on_pre_execute ──► (action selected) ──► on_execute ──► action.execute
//!                                                              │
//! on_post_execute ◄────────── always, with ctx.failure() set on error
//! ```

use super::error::GatewayResult;
use super::request::{Action, Request};
use std::fmt;
use std::sync::Arc;

/// Per-execution state shared by the extension hooks.
pub struct Context<'a> {
    request: &'a mut dyn Request,
    action: Option<Arc<dyn Action>>,
    depth: usize,
    failure: Option<String>,
}

impl<'a> Context<'a> {
    /// Start a context for `request` at nesting `depth` (1 for a top-level
    /// execute).
    pub fn new(request: &'a mut dyn Request, depth: usize) -> Self {
        Self {
            request,
            action: None,
            depth,
            failure: None,
        }
    }

    /// The request being executed.
    pub fn request(&self) -> &dyn Request {
        &*self.request
    }

    /// Mutable access to the request being executed.
    pub fn request_mut(&mut self) -> &mut dyn Request {
        &mut *self.request
    }

    /// The selected action, once chosen.
    pub fn action(&self) -> Option<&Arc<dyn Action>> {
        self.action.as_ref()
    }

    /// Pre-select the action; the gateway then skips its own lookup.
    pub fn set_action(&mut self, action: Arc<dyn Action>) {
        self.action = Some(action);
    }

    /// Number of executions on the stack, this one included.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Executions that enclose this one.
    pub fn previous(&self) -> usize {
        self.depth.saturating_sub(1)
    }

    /// Failure message when an earlier step failed (visible to
    /// `on_post_execute`).
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub(crate) fn set_failure(&mut self, failure: String) {
        self.failure = Some(failure);
    }

    pub(crate) fn parts(&mut self) -> (&mut dyn Request, Option<Arc<dyn Action>>) {
        (&mut *self.request, self.action.clone())
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request", &self.request)
            .field("action", &self.action.as_ref().map(|a| a.name().to_string()))
            .field("depth", &self.depth)
            .field("failure", &self.failure)
            .finish()
    }
}

/// Cross-cutting hooks around every execution.
///
/// All hooks default to no-ops. Returning an error from `on_pre_execute` or
/// `on_execute` aborts the execution (post hooks still run).
pub trait Extension: Send + Sync {
    /// Before the action is selected.
    fn on_pre_execute(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        let _ = context;
        Ok(())
    }

    /// After the action is selected, right before it runs.
    fn on_execute(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        let _ = context;
        Ok(())
    }

    /// After the execution, successful or not.
    fn on_post_execute(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        let _ = context;
        Ok(())
    }
}

/// Ordered composition of extensions, itself an [`Extension`].
#[derive(Clone, Default)]
pub struct ExtensionChain {
    extensions: Vec<Arc<dyn Extension>>,
}

impl ExtensionChain {
    /// Chain `extensions` in the given order.
    pub fn new(extensions: Vec<Arc<dyn Extension>>) -> Self {
        Self { extensions }
    }

    /// The chained extensions, in call order.
    pub fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.extensions
    }

    /// Number of chained extensions.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Extension for ExtensionChain {
    fn on_pre_execute(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        self.extensions
            .iter()
            .try_for_each(|extension| extension.on_pre_execute(context))
    }

    fn on_execute(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        self.extensions
            .iter()
            .try_for_each(|extension| extension.on_execute(context))
    }

    fn on_post_execute(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        self.extensions
            .iter()
            .try_for_each(|extension| extension.on_post_execute(context))
    }
}

impl fmt::Debug for ExtensionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionChain")
            .field("len", &self.extensions.len())
            .finish()
    }
}
