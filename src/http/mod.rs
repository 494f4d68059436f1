//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, trace layers)
//!     → request.rs (parts + body → RequestContext)
//!     → FrontController (current snapshot)
//!     → response.rs (Rendered / ControllerError → HTTP response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{context_from_request, RequestError, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
