//! Built-in actions.

mod get_http_request;
mod render_template;

pub use get_http_request::{GetHttpRequest, GetHttpRequestAction, ServerVars};
pub use render_template::{RenderTemplate, RenderTemplateAction};
