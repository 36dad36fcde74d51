//! Gateway contract and assembly.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ Gateway                                                    │
//! │   apis:       [Value, …]            (api.*,  prepend_apis) │
//! │   actions:    [Arc<dyn Action>, …]  (action.*, prepend_…)  │
//! │   extensions: ExtensionChain        (extension.*, …)       │
//! │   config:     ScalarConfig          (everything else)      │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`build_gateway`] extracts the three collections from a registry and
//! [`assemble`]s them; [`GatewayFactory`] is the public entry point that
//! produces the registry in the first place.

pub mod assemble;
pub mod error;
pub mod extension;
pub mod factory;
pub mod request;

mod runtime;

pub use assemble::{ScalarConfig, assemble, build_gateway};
pub use error::{GatewayError, GatewayResult};
pub use extension::{Context, Extension, ExtensionChain};
pub use factory::GatewayFactory;
pub use request::{Action, Request};
pub use runtime::Gateway;
