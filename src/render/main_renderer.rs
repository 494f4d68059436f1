//! Format resolution and primary action execution.
//!
//! # Responsibilities
//! - Resolve the output format for a request
//! - Instantiate and run the primary action before any rendering
//! - Hand the request to the resolved format renderer
//!
//! # Design Decisions
//! - The format is resolved before the action runs, so a misconfigured
//!   request fails without side effects
//! - An unresolved format is an error; there is no fallback renderer

use std::sync::Arc;

use axum::http::StatusCode;

use crate::context::RequestContext;
use crate::dispatch::Dispatcher;
use crate::render::format::{FormatRegistry, FormatRenderer};
use crate::render::fragments::FragmentStore;
use crate::render::RenderError;

/// Attribute an action sets to request a `Location` header.
pub const LOCATION_ATTRIBUTE: &str = "location";

/// Response produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub status: StatusCode,
    /// Absent when the action suppressed rendering.
    pub content_type: Option<String>,
    pub body: Option<String>,
    pub location: Option<String>,
}

/// Top-level renderer owning the frozen format registry.
#[derive(Clone)]
pub struct MainRenderer {
    dispatcher: Dispatcher,
    formats: FormatRegistry,
    default_format: Option<String>,
}

impl MainRenderer {
    pub fn new(dispatcher: Dispatcher, formats: FormatRegistry, default_format: Option<String>) -> Self {
        Self {
            dispatcher,
            formats,
            default_format: default_format.filter(|f| !f.is_empty()),
        }
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Pick the renderer: the context's format (rule override or declared
    /// `type`), else the configured default.
    pub fn resolve_format(&self, ctx: &RequestContext) -> Result<(String, Arc<dyn FormatRenderer>), RenderError> {
        let format = ctx
            .format()
            .map(|f| f.as_str().to_string())
            .or_else(|| self.default_format.clone());

        match format {
            Some(name) => match self.formats.get(&name) {
                Some(renderer) => Ok((name, Arc::clone(renderer))),
                None => Err(RenderError::NoRendererResolved(Some(name))),
            },
            None => Err(RenderError::NoRendererResolved(None)),
        }
    }

    /// Run the primary action and render its response.
    pub async fn render(&self, ctx: &Arc<RequestContext>) -> Result<Rendered, RenderError> {
        let (format, renderer) = self.resolve_format(ctx)?;

        let mut needs_renderer = true;
        if let Some(action) = ctx.action() {
            let instance = self.dispatcher.instantiate(&action, ctx)?;
            needs_renderer = instance.needs_renderer();
            self.dispatcher
                .dispatch(instance)
                .await
                .map_err(|failure| RenderError::action_failed(vec![failure], FragmentStore::new()))?;
        }

        let location = ctx
            .attribute(LOCATION_ATTRIBUTE)
            .and_then(|v| v.as_str().map(str::to_string));

        if !needs_renderer {
            tracing::debug!(request_id = %ctx.request_id(), "Rendering suppressed by action");
            return Ok(Rendered {
                status: ctx.status(),
                content_type: None,
                body: None,
                location,
            });
        }

        let body = renderer.render(ctx).await?;
        tracing::debug!(
            request_id = %ctx.request_id(),
            format = %format,
            bytes = body.len(),
            "Response rendered"
        );

        Ok(Rendered {
            status: ctx.status(),
            content_type: Some(renderer.mime_type().to_string()),
            body: Some(body),
            location,
        })
    }
}
