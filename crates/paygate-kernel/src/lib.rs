//! Paygate kernel.
//!
//! The kernel turns a flat, ordered mapping of named configuration entries
//! into a wired [`Gateway`](gateway::Gateway):
//!
//! ```text
//! built-ins ─┐
//! defaults  ─┼─► layered_defaults ─► ConfigRegistry ─► extract × 3 ─► assemble ─► Gateway
//! overrides ─┘        (deferred entries resolve lazily, once)
//! ```
//!
//! Concrete built-ins (HTTP client, template engine, default actions) live in
//! `paygate-core`; this crate only holds the engine and the contracts.

// config module
pub mod config;

// gateway module
pub mod gateway;

pub use config::{
    ConfigError, ConfigRegistry, ConfigResult, Deferred, MergePolicy, Namespace, Value,
    layered_defaults, layered_merge,
};
pub use gateway::{
    Action, Context, Extension, ExtensionChain, Gateway, GatewayError, GatewayFactory,
    GatewayResult, Request, ScalarConfig, build_gateway,
};
