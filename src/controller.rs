//! Front controller: one entry point for every request.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → Router::resolve          (NoMatch → 404)
//!     → Dispatcher::prototype    (UnknownAction → 404)
//!     → credential check         (CredentialDenied → 403)
//!     → MainRenderer::render     (failure → 500)
//!     → Rendered
//! ```
//!
//! # Design Decisions
//! - A controller is built once from config and never mutated; reloads
//!   build a new one
//! - Credentials are checked against the prototype, before any instance
//!   of the action exists

use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;

use crate::context::RequestContext;
use crate::dispatch::{DispatchError, Dispatcher};
use crate::render::{MainRenderer, RenderError, Rendered};
use crate::routing::Router;

/// Why a request could not be served.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("no rule matches `{0}`")]
    NoMatch(String),

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("credentials required by `{0}` are not held")]
    CredentialDenied(String),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl ControllerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ControllerError::NoMatch(_) | ControllerError::UnknownAction(_) => StatusCode::NOT_FOUND,
            ControllerError::CredentialDenied(_) => StatusCode::FORBIDDEN,
            ControllerError::Render(RenderError::Dispatch(DispatchError::UnknownAction(_))) => StatusCode::NOT_FOUND,
            ControllerError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Frozen router, dispatcher and renderer serving requests together.
pub struct FrontController {
    router: Router,
    dispatcher: Dispatcher,
    renderer: MainRenderer,
    uri_root: String,
}

impl FrontController {
    pub fn new(router: Router, dispatcher: Dispatcher, renderer: MainRenderer) -> Self {
        Self {
            router,
            dispatcher,
            renderer,
            uri_root: "/".to_string(),
        }
    }

    /// Mount point handed to every request context built for this controller.
    pub fn with_uri_root(mut self, root: impl Into<String>) -> Self {
        self.uri_root = root.into();
        self
    }

    pub fn uri_root(&self) -> &str {
        &self.uri_root
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn renderer(&self) -> &MainRenderer {
        &self.renderer
    }

    /// Serve one request.
    pub async fn handle(&self, ctx: Arc<RequestContext>) -> Result<Rendered, ControllerError> {
        let Some(action) = self.router.resolve(&ctx) else {
            tracing::warn!(request_id = %ctx.request_id(), path = %ctx.path(), "No rule matched");
            return Err(ControllerError::NoMatch(ctx.path().to_string()));
        };

        let Some(prototype) = self.dispatcher.prototype(action) else {
            tracing::warn!(request_id = %ctx.request_id(), action = %action, "Rule names an unknown action");
            return Err(ControllerError::UnknownAction(action.to_string()));
        };

        if !prototype.has_credentials(ctx.credentials()) {
            tracing::warn!(
                request_id = %ctx.request_id(),
                action = %action,
                held = ctx.credentials().len(),
                "Credentials denied"
            );
            return Err(ControllerError::CredentialDenied(action.to_string()));
        }

        self.renderer.render(&ctx).await.map_err(|e| {
            tracing::error!(request_id = %ctx.request_id(), action = %action, error = %e, "Render failed");
            ControllerError::Render(e)
        })
    }
}
