//! Rendering subsystem.
//!
//! # Data Flow
//! ```text
//! MainRenderer::render(ctx)
//!     → resolve format (rule override, declared `type`, default)
//!     → instantiate + dispatch the primary action
//!     → action suppresses rendering? → no body
//!     → FormatRenderer::render
//!         html: LeveledRenderer
//!             → CURRENT from the primary action's template
//!             → per depth: dispatch batch, then render that depth's fragments
//!             → "main" template over the fragment store
//!         json: serialize the `model` attribute
//! ```
//!
//! # Design Decisions
//! - Depth d never starts before depth d-1 has been stored
//! - A fragment only sees fragments of smaller depth
//! - The format registry is frozen before serving; no fallback format

pub mod format;
pub mod fragments;
pub mod json;
pub mod leveled;
pub mod levels;
pub mod main_renderer;
pub mod template;

use thiserror::Error;

use crate::dispatch::{ActionFailure, DispatchError};

pub use format::{FormatRegistry, FormatRegistryBuilder, FormatRenderer};
pub use fragments::{FragmentStore, CURRENT};
pub use json::JsonRenderer;
pub use leveled::{Composition, LeveledRenderer, MAIN_TEMPLATE};
pub use levels::{LevelError, LevelMap};
pub use main_renderer::{MainRenderer, Rendered};
pub use template::{TemplateEngine, TemplateError, TemplateStore};

/// Errors raised while producing a response body.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No format renderer is registered for the resolved format.
    #[error("no format renderer for {}", describe_format(.0))]
    NoRendererResolved(Option<String>),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// One or more actions failed. Fragments that did render are kept.
    #[error("{} action(s) failed: {}", .failures.len(), summarize(.failures))]
    ActionFailed {
        failures: Vec<ActionFailure>,
        partial: FragmentStore,
    },

    /// A fragment name was written twice in one request.
    #[error("fragment `{0}` was already rendered for this request")]
    FragmentRewritten(String),

    #[error("failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl RenderError {
    pub(crate) fn action_failed(failures: Vec<ActionFailure>, partial: FragmentStore) -> Self {
        Self::ActionFailed { failures, partial }
    }
}

fn describe_format(format: &Option<String>) -> String {
    match format {
        Some(name) => format!("`{name}`"),
        None => "a request without a format".to_string(),
    }
}

fn summarize(failures: &[ActionFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
