//! Front controller: rule routing, concurrent action dispatch and
//! priority-ordered page composition behind one HTTP entry point.

pub mod action;
pub mod config;
pub mod context;
pub mod controller;
pub mod dispatch;
pub mod freeze;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod render;
pub mod routing;

pub use config::FrontConfig;
pub use controller::{ControllerError, FrontController};
pub use freeze::FrozenError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
