//! Built-in extensions.

mod endless_cycle_detector;
mod log_executed_actions;

pub use endless_cycle_detector::{DEFAULT_CYCLE_LIMIT, EndlessCycleDetectorExtension};
pub use log_executed_actions::LogExecutedActionsExtension;
