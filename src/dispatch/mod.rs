//! Action dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     configured identifiers
//!     → catalog.rs (identifier → constructor)
//!     → dispatcher.rs (one prototype each, then freeze)
//!
//! Per request:
//!     identifier + RequestContext
//!     → instantiate (fresh action bound to the request)
//!     → dispatch / dispatch_all (worker tasks, joined)
//!     → BatchReport (per-member outcome)
//! ```

pub mod catalog;
pub mod dispatcher;
pub mod instance;

use thiserror::Error;

use crate::action::ActionError;

pub use catalog::{ActionCatalog, ActionConstructor};
pub use dispatcher::{Dispatcher, DispatcherBuilder, DEFAULT_MAX_CONCURRENCY};
pub use instance::{ActionFailure, ActionInstance, BatchReport, FailureCause};

/// Errors raised while preparing an action for execution.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No prototype is registered under this identifier.
    #[error("unknown action `{0}`")]
    UnknownAction(String),

    /// The constructor failed for this request.
    #[error("failed to construct action `{id}`: {source}")]
    Construction {
        id: String,
        #[source]
        source: ActionError,
    },
}
