//! Paygate core.
//!
//! [`CoreGatewayFactory`] produces gateways wired with the core built-ins:
//!
//! | key                                | entry                                   |
//! |------------------------------------|-----------------------------------------|
//! | `template.layout`                  | `@PaygateCore/layout.html`              |
//! | `paths`                            | `{PaygateCore: <crate>/templates}`      |
//! | `template.env`                     | [`TemplateEngine`] over `paths`         |
//! | `api.http_client` / `http_client`  | one shared [`HttpClient`]               |
//! | `action.get_http_request`          | [`GetHttpRequestAction`]                |
//! | `action.render_template`           | [`RenderTemplateAction`]                |
//! | `extension.endless_cycle_detector` | [`EndlessCycleDetectorExtension`]       |
//!
//! ```rust,ignore
//! use paygate_core::CoreGatewayFactory;
//! use paygate_kernel::{ConfigRegistry, GatewayFactory};
//!
//! let gateway = CoreGatewayFactory::new().create(
//!     ConfigRegistry::new().with("prepend_actions", serde_json::json!(["action.render_template"])),
//! )?;
//! ```

pub mod action;
pub mod extension;
pub mod factory;
pub mod http;
pub mod template;

pub use action::{
    GetHttpRequest, GetHttpRequestAction, RenderTemplate, RenderTemplateAction, ServerVars,
};
pub use extension::{EndlessCycleDetectorExtension, LogExecutedActionsExtension};
pub use factory::{CORE_NAMESPACE, CoreGatewayFactory, DEFAULT_LAYOUT, templates_dir};
pub use http::{HttpClient, HttpError, HttpRequest, HttpResponse};
pub use template::{TemplateEngine, TemplateError};
