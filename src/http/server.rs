//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the front handler on every path
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener
//! - Swap in a freshly built controller when the config changes
//! - Record request metrics

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::FrontConfig;
use crate::controller::FrontController;
use crate::dispatch::ActionCatalog;
use crate::http::request::context_from_request;
use crate::lifecycle::{build_controller, Shutdown};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ArcSwap<FrontController>>,
    pub max_body_bytes: usize,
}

/// HTTP server for the front controller.
pub struct HttpServer {
    router: Router,
    state: AppState,
    catalog: ActionCatalog,
}

impl HttpServer {
    /// Create a new HTTP server around an already built controller.
    pub fn new(config: &FrontConfig, controller: FrontController, catalog: ActionCatalog) -> Self {
        let state = AppState {
            controller: Arc::new(ArcSwap::from_pointee(controller)),
            max_body_bytes: config.limits.max_body_bytes,
        };
        let router = Self::build_router(config, state.clone());
        Self {
            router,
            state,
            catalog,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &FrontConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(front_handler))
            .route("/", any(front_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The Axum router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The controller currently serving requests.
    pub fn controller(&self) -> Arc<FrontController> {
        self.state.controller.load_full()
    }

    /// Build a controller from `config` and publish it.
    ///
    /// On failure the current controller keeps serving.
    pub fn reload(&self, config: &FrontConfig) -> bool {
        match build_controller(config, &self.catalog) {
            Ok(controller) => {
                self.state.controller.store(Arc::new(controller));
                tracing::info!("Controller reloaded");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Reload rejected; keeping current controller");
                false
            }
        }
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: Option<mpsc::UnboundedReceiver<FrontConfig>>,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router();
        let server = Arc::new(self);

        if let Some(mut updates) = config_updates {
            let server = Arc::clone(&server);
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        update = updates.recv() => match update {
                            Some(config) => {
                                server.reload(&config);
                            }
                            None => break,
                        },
                        _ = shutdown.wait() => break,
                    }
                }
            });
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Front handler: every request goes through the current controller.
async fn front_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let controller = state.controller.load_full();

    let ctx = match context_from_request(request, state.max_body_bytes, controller.uri_root()).await {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            tracing::warn!(error = %e, "Rejected request");
            let response = e.into_response();
            metrics::record_request(response.status().as_u16(), "none", start);
            return response;
        }
    };

    tracing::debug!(
        request_id = %ctx.request_id(),
        method = %ctx.method(),
        path = %ctx.path(),
        "Handling request"
    );

    let response = match controller.handle(Arc::clone(&ctx)).await {
        Ok(rendered) => rendered.into_response(),
        Err(e) => e.into_response(),
    };

    let action = ctx.action();
    metrics::record_request(
        response.status().as_u16(),
        action.as_deref().map(String::as_str).unwrap_or("none"),
        start,
    );
    response
}
