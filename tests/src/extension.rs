use paygate_kernel::gateway::{Context, Extension, GatewayError, GatewayResult};
use parking_lot::Mutex;
use std::sync::Arc;

/// One hook invocation seen by [`MockExtension`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    PreExecute { request: String, depth: usize },
    Execute { action: String, depth: usize },
    PostExecute { depth: usize, failure: Option<String> },
}

/// A mock extension recording every hook call.
#[derive(Clone, Default)]
pub struct MockExtension {
    label: String,
    veto: Option<String>,
    /// Hook calls, in order.
    pub events: Arc<Mutex<Vec<HookEvent>>>,
}

impl MockExtension {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }

    /// Fail every `on_pre_execute` with `reason`.
    pub fn vetoing(mut self, reason: &str) -> Self {
        self.veto = Some(reason.to_string());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, HookEvent::PreExecute { .. }))
            .count()
    }
}

impl Extension for MockExtension {
    fn on_pre_execute(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        self.events.lock().push(HookEvent::PreExecute {
            request: context.request().request_name().to_string(),
            depth: context.depth(),
        });
        match &self.veto {
            Some(reason) => Err(GatewayError::action_failed(&self.label, reason)),
            None => Ok(()),
        }
    }

    fn on_execute(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        self.events.lock().push(HookEvent::Execute {
            action: context
                .action()
                .map(|action| action.name().to_string())
                .unwrap_or_default(),
            depth: context.depth(),
        });
        Ok(())
    }

    fn on_post_execute(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        self.events.lock().push(HookEvent::PostExecute {
            depth: context.depth(),
            failure: context.failure().map(str::to_string),
        });
        Ok(())
    }
}
