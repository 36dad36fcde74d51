//! Gateway factory interface
//!
//! The kernel only keeps the abstract interface; the core factory with its
//! built-in entries lives in `paygate-core`.

use super::assemble::build_gateway;
use super::runtime::Gateway;
use crate::config::{ConfigRegistry, ConfigResult};

/// Produces gateway configs and gateways.
///
/// # Example
///
/// ```rust,ignore
/// use paygate_kernel::{ConfigRegistry, ConfigResult, GatewayFactory, MergePolicy, layered_merge};
///
/// struct AcmeGatewayFactory {
///     defaults: ConfigRegistry,
/// }
///
/// impl GatewayFactory for AcmeGatewayFactory {
///     fn create_config(&self, overrides: ConfigRegistry) -> ConfigResult<ConfigRegistry> {
///         Ok(layered_merge([self.defaults.clone(), overrides], &MergePolicy::default()))
///     }
/// }
/// ```
pub trait GatewayFactory: Send + Sync {
    /// Merge built-ins, factory defaults and `overrides` into a registry.
    ///
    /// Deferred entries are not forced.
    fn create_config(&self, overrides: ConfigRegistry) -> ConfigResult<ConfigRegistry>;

    /// Build a fresh gateway from [`create_config`](Self::create_config).
    fn create(&self, overrides: ConfigRegistry) -> ConfigResult<Gateway> {
        build_gateway(self.create_config(overrides)?)
    }
}
