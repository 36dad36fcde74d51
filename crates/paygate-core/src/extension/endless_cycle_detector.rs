use paygate_kernel::gateway::{Context, Extension, GatewayError, GatewayResult};
use tracing::warn;

/// Nesting limit of the built-in detector.
pub const DEFAULT_CYCLE_LIMIT: usize = 100;

/// Aborts executions nested deeper than `limit`.
///
/// Actions that execute sub-requests can end up handing a request back to
/// themselves; the detector turns that into an error instead of a stack
/// overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndlessCycleDetectorExtension {
    limit: usize,
}

impl EndlessCycleDetectorExtension {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for EndlessCycleDetectorExtension {
    fn default() -> Self {
        Self::new(DEFAULT_CYCLE_LIMIT)
    }
}

impl Extension for EndlessCycleDetectorExtension {
    fn on_pre_execute(&self, context: &mut Context<'_>) -> GatewayResult<()> {
        if context.previous() >= self.limit {
            warn!(
                limit = self.limit,
                request = context.request().request_name(),
                "possible endless cycle detected"
            );
            return Err(GatewayError::EndlessCycle { limit: self.limit });
        }
        Ok(())
    }
}
