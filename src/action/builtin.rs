//! Actions shipped with the server binary.

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;

use crate::action::{Action, ActionError};
use crate::context::RequestContext;
use crate::dispatch::ActionCatalog;

/// Echoes the `payload` parameter into the `payload` attribute.
#[derive(Debug, Default)]
pub struct DefaultAction;

#[async_trait]
impl Action for DefaultAction {
    async fn proceed(&self, ctx: &RequestContext) -> Result<(), ActionError> {
        let payload = ctx.param("payload");
        tracing::info!(request_id = %ctx.request_id(), payload = ?payload, "Default action proceeded");
        ctx.set_attribute("payload", payload.unwrap_or_default());
        Ok(())
    }
}

/// Publishes a small status model for JSON clients.
#[derive(Debug, Default)]
pub struct StatusAction;

#[async_trait]
impl Action for StatusAction {
    async fn proceed(&self, ctx: &RequestContext) -> Result<(), ActionError> {
        ctx.set_attribute(
            "model",
            json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
            }),
        );
        Ok(())
    }
}

/// Redirects to the `to` parameter without rendering a body.
#[derive(Debug, Default)]
pub struct RedirectAction;

#[async_trait]
impl Action for RedirectAction {
    async fn proceed(&self, ctx: &RequestContext) -> Result<(), ActionError> {
        let target = ctx
            .param("to")
            .ok_or_else(|| ActionError::MissingParameter("to".into()))?;
        ctx.set_attribute("location", target);
        ctx.set_status(StatusCode::FOUND);
        Ok(())
    }

    fn needs_renderer(&self) -> bool {
        false
    }
}

/// Catalog with every built-in action under its type name.
pub fn catalog() -> ActionCatalog {
    ActionCatalog::new()
        .with_default::<DefaultAction>("DefaultAction")
        .with_default::<StatusAction>("StatusAction")
        .with_default::<RedirectAction>("RedirectAction")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[tokio::test]
    async fn test_redirect_sets_location() {
        let ctx = RequestContext::builder(Method::GET, "/go").query("to=/home").build();
        RedirectAction.proceed(&ctx).await.unwrap();

        assert_eq!(ctx.status(), StatusCode::FOUND);
        assert_eq!(ctx.attribute("location").unwrap(), "/home");
        assert!(!RedirectAction.needs_renderer());
    }

    #[tokio::test]
    async fn test_redirect_requires_target() {
        let ctx = RequestContext::builder(Method::GET, "/go").build();
        let err = RedirectAction.proceed(&ctx).await.unwrap_err();
        assert!(matches!(err, ActionError::MissingParameter(ref p) if p == "to"));
    }

    #[tokio::test]
    async fn test_default_echoes_payload() {
        let ctx = RequestContext::builder(Method::POST, "/").param("payload", "hi").build();
        DefaultAction.proceed(&ctx).await.unwrap();
        assert_eq!(ctx.attribute("payload").unwrap(), "hi");
    }

    #[test]
    fn test_catalog_lists_builtins() {
        let catalog = catalog();
        assert!(catalog.contains("DefaultAction"));
        assert!(catalog.contains("StatusAction"));
        assert!(catalog.contains("RedirectAction"));
    }
}
