//! Per-request action instances and batch outcomes.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::action::{Action, ActionError, CredentialSet};
use crate::context::RequestContext;

/// A fresh action bound to exactly one request.
pub struct ActionInstance {
    id: String,
    action: Box<dyn Action>,
    ctx: Arc<RequestContext>,
}

impl ActionInstance {
    pub(crate) fn new(id: impl Into<String>, action: Box<dyn Action>, ctx: Arc<RequestContext>) -> Self {
        Self {
            id: id.into(),
            action,
            ctx,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn context(&self) -> &Arc<RequestContext> {
        &self.ctx
    }

    pub fn needs_renderer(&self) -> bool {
        self.action.needs_renderer()
    }

    pub fn has_credentials(&self, held: &CredentialSet) -> bool {
        self.action.has_credentials(held)
    }

    /// Run the unit of work, consuming the instance.
    pub async fn run(self) -> Result<(), ActionError> {
        self.action.proceed(&self.ctx).await
    }
}

impl fmt::Debug for ActionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionInstance")
            .field("id", &self.id)
            .field("request_id", &self.ctx.request_id())
            .finish()
    }
}

/// Why a dispatched action did not complete.
#[derive(Debug, Error)]
pub enum FailureCause {
    /// `proceed` returned an error.
    #[error(transparent)]
    Error(ActionError),

    /// The worker task panicked.
    #[error("panicked: {0}")]
    Panicked(String),

    /// The worker task was cancelled before finishing.
    #[error("cancelled before completion")]
    Cancelled,
}

/// One failed action of a dispatch or batch.
#[derive(Debug, Error)]
#[error("action `{action}` failed: {cause}")]
pub struct ActionFailure {
    pub action: String,
    #[source]
    pub cause: FailureCause,
}

impl ActionFailure {
    pub fn new(action: impl Into<String>, cause: FailureCause) -> Self {
        Self {
            action: action.into(),
            cause,
        }
    }
}

/// Per-member outcome of a concurrent batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Identifiers that completed, in submission order.
    pub completed: Vec<String>,
    /// Members that failed, in submission order.
    pub failures: Vec<ActionFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn succeeded(&self, id: &str) -> bool {
        self.completed.iter().any(|c| c == id)
    }

    pub fn failed(&self, id: &str) -> bool {
        self.failures.iter().any(|f| f.action == id)
    }

    pub fn into_result(self) -> Result<Vec<String>, Vec<ActionFailure>> {
        if self.failures.is_empty() {
            Ok(self.completed)
        } else {
            Err(self.failures)
        }
    }
}
