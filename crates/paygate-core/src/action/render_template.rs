use crate::template::TemplateEngine;
use paygate_kernel::gateway::{Action, Gateway, GatewayError, GatewayResult, Request};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

/// Render a named template; the output lands in [`result`](Self::result).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderTemplate {
    pub template_name: String,
    pub parameters: Map<String, JsonValue>,
    pub result: Option<String>,
}

impl RenderTemplate {
    pub fn new(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Renders [`RenderTemplate`] requests with the gateway's template engine.
///
/// Every render gets a `layout` parameter naming the configured layout
/// unless the request already sets one.
#[derive(Debug, Clone)]
pub struct RenderTemplateAction {
    engine: Arc<TemplateEngine>,
    layout: String,
}

impl RenderTemplateAction {
    pub fn new(engine: Arc<TemplateEngine>, layout: impl Into<String>) -> Self {
        Self {
            engine,
            layout: layout.into(),
        }
    }

    pub fn engine(&self) -> &Arc<TemplateEngine> {
        &self.engine
    }

    pub fn layout(&self) -> &str {
        &self.layout
    }
}

impl Action for RenderTemplateAction {
    fn supports(&self, request: &dyn Request) -> bool {
        request.is::<RenderTemplate>()
    }

    fn execute(&self, request: &mut dyn Request, _gateway: &Gateway) -> GatewayResult<()> {
        let Some(render) = request.downcast_mut::<RenderTemplate>() else {
            return Err(GatewayError::RequestNotSupported(
                (*request).request_name().to_string(),
            ));
        };

        let mut parameters = render.parameters.clone();
        parameters
            .entry("layout")
            .or_insert_with(|| JsonValue::String(self.layout.clone()));

        let html = self
            .engine
            .render(&render.template_name, &parameters)
            .map_err(|e| GatewayError::action_failed(self.name(), e))?;
        render.result = Some(html);
        Ok(())
    }
}
