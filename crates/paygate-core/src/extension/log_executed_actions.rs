use paygate_kernel::gateway::{Context, Extension, GatewayResult};
use tracing::{info, warn};

/// Logs every action execution at `info` and failures at `warn`.
///
/// Not registered by default; add it as `extension.log_executed_actions`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogExecutedActionsExtension;

impl LogExecutedActionsExtension {
    pub fn new() -> Self {
        Self
    }
}

impl Extension for LogExecutedActionsExtension {
    fn on_execute(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        let action = context.action().map(|a| a.name().to_string()).unwrap_or_default();
        info!(
            depth = context.depth(),
            request = context.request().request_name(),
            action = %action,
            "executing action"
        );
        Ok(())
    }

    fn on_post_execute(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        if let Some(failure) = context.failure() {
            warn!(
                depth = context.depth(),
                request = context.request().request_name(),
                failure,
                "execution failed"
            );
        }
        Ok(())
    }
}
