//! The `json` format.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::render::format::FormatRenderer;
use crate::render::RenderError;

/// Attribute holding the object a JSON response serializes.
pub const MODEL_ATTRIBUTE: &str = "model";

/// Serializes the `model` attribute; an absent model yields an empty body.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderer;

#[async_trait]
impl FormatRenderer for JsonRenderer {
    async fn render(&self, ctx: &Arc<RequestContext>) -> Result<String, RenderError> {
        match ctx.attribute(MODEL_ATTRIBUTE) {
            Some(model) => Ok(serde_json::to_string(&model)?),
            None => Ok(String::new()),
        }
    }

    fn mime_type(&self) -> &str {
        "application/json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_serializes_model() {
        let ctx = Arc::new(RequestContext::builder(Method::GET, "/").build());
        ctx.set_attribute(MODEL_ATTRIBUTE, json!({"id": 42, "tags": ["a"]}));

        let body = JsonRenderer.render(&ctx).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed, json!({"id": 42, "tags": ["a"]}));
    }

    #[tokio::test]
    async fn test_empty_without_model() {
        let ctx = Arc::new(RequestContext::builder(Method::GET, "/").build());
        assert_eq!(JsonRenderer.render(&ctx).await.unwrap(), "");
        assert_eq!(JsonRenderer.mime_type(), "application/json");
    }
}
