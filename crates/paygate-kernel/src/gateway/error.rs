//! Gateway error types for `paygate-kernel`.
//!
//! [`GatewayError`] covers failures while a request travels through an
//! assembled gateway. Configuration failures surfaced while executing (a
//! lazily read option, for instance) are wrapped in [`GatewayError::Config`].

use crate::config::ConfigError;
use thiserror::Error;

/// Result alias for gateway execution.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Runtime error type of an assembled gateway.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// No action in the gateway supports the request.
    #[error("request '{0}' is not supported by any action")]
    RequestNotSupported(String),

    /// Nested execution reached the cycle detector's limit.
    #[error("possible endless cycle detected: execute was nested {limit} times")]
    EndlessCycle {
        /// The configured nesting limit.
        limit: usize,
    },

    /// An action failed while handling a request.
    #[error("action '{action}' failed: {reason}")]
    ActionFailed {
        /// Name of the failing action.
        action: String,
        /// Failure description.
        reason: String,
    },

    /// A configuration lookup failed during execution.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl GatewayError {
    /// Build a [`GatewayError::ActionFailed`] from any displayable failure.
    pub fn action_failed(action: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ActionFailed {
            action: action.into(),
            reason: reason.to_string(),
        }
    }
}
