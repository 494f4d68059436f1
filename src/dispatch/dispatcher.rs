//! Prototype registry and action execution.
//!
//! # Responsibilities
//! - Build one prototype per configured identifier at startup
//! - Freeze the registry for lock-free concurrent reads
//! - Instantiate fresh per-request actions
//! - Run single actions and concurrent batches on worker tasks
//!
//! # Design Decisions
//! - Unknown or unconstructible identifiers are logged and left out,
//!   never fatal to startup
//! - Every action runs on its own task so a panic stays contained
//! - A batch joins every member before returning, failed or not
//! - A semaphore bounds how many actions run at once across requests

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::action::{Action, ActionError};
use crate::context::RequestContext;
use crate::dispatch::catalog::{ActionCatalog, ActionConstructor};
use crate::dispatch::instance::{ActionFailure, ActionInstance, BatchReport, FailureCause};
use crate::dispatch::DispatchError;
use crate::freeze::{FrozenError, Staged};
use crate::observability::metrics;

/// Default bound on concurrently running actions.
pub const DEFAULT_MAX_CONCURRENCY: usize = 64;

struct Prototype {
    constructor: ActionConstructor,
    template: Box<dyn Action>,
}

type Registry = HashMap<String, Prototype>;

/// Frozen prototypes and the worker bound created with them.
struct Sealed {
    prototypes: Registry,
    permits: Arc<Semaphore>,
}

/// Build-phase prototype registry.
pub struct DispatcherBuilder {
    catalog: ActionCatalog,
    registry: Staged<Registry, Sealed>,
    max_concurrency: usize,
}

impl DispatcherBuilder {
    pub fn new(catalog: ActionCatalog) -> Self {
        Self {
            catalog,
            registry: Staged::new("action registry"),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Bound on concurrently running actions, clamped to `1..=Semaphore::MAX_PERMITS`.
    /// Only the value set before the first `freeze` takes effect.
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    /// Build a prototype for each distinct identifier.
    ///
    /// Returns how many new prototypes were added. Identifiers missing from
    /// the catalog, or whose constructor fails, are logged and skipped.
    pub fn register_prototypes<I, S>(&mut self, ids: I) -> Result<usize, FrozenError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = self.registry.open_mut()?;
        let mut added = 0;

        for id in ids {
            let id = id.as_ref();
            if registry.contains_key(id) {
                continue;
            }

            let Some(constructor) = self.catalog.constructor(id) else {
                tracing::warn!(action = %id, "No constructor for action; it will be treated as unknown");
                continue;
            };

            match constructor() {
                Ok(template) => {
                    registry.insert(
                        id.to_string(),
                        Prototype {
                            constructor: Arc::clone(constructor),
                            template,
                        },
                    );
                    added += 1;
                }
                Err(e) => {
                    tracing::warn!(action = %id, error = %e, "Action prototype construction failed; skipping");
                }
            }
        }

        Ok(added)
    }

    /// Number of registered prototypes (zero once frozen).
    pub fn len(&self) -> usize {
        self.registry.open_ref().map(HashMap::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seal the registry. Calling this again returns a dispatcher sharing
    /// the same prototypes and the same worker bound.
    pub fn freeze(&mut self) -> Dispatcher {
        let max_concurrency = self.max_concurrency;
        let sealed = self.registry.freeze_with(|prototypes| {
            tracing::info!(prototypes = prototypes.len(), max_concurrency, "Action registry frozen");
            Sealed {
                prototypes,
                permits: Arc::new(Semaphore::new(max_concurrency)),
            }
        });
        Dispatcher {
            permits: Arc::clone(&sealed.permits),
            registry: sealed,
        }
    }
}

/// Frozen registry plus the shared worker bound.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Sealed>,
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn contains(&self, id: &str) -> bool {
        self.registry.prototypes.contains_key(id)
    }

    /// The request-independent prototype, for metadata such as credentials.
    pub fn prototype(&self, id: &str) -> Option<&dyn Action> {
        self.registry.prototypes.get(id).map(|p| p.template.as_ref())
    }

    pub fn len(&self) -> usize {
        self.registry.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.prototypes.is_empty()
    }

    /// Create a fresh instance of `id` bound to `ctx`.
    pub fn instantiate(&self, id: &str, ctx: &Arc<RequestContext>) -> Result<ActionInstance, DispatchError> {
        let prototype = self
            .registry
            .prototypes
            .get(id)
            .ok_or_else(|| DispatchError::UnknownAction(id.to_string()))?;

        let action = (prototype.constructor)().map_err(|source| DispatchError::Construction {
            id: id.to_string(),
            source,
        })?;

        Ok(ActionInstance::new(id, action, Arc::clone(ctx)))
    }

    /// Instantiate every known identifier, skipping those without a prototype.
    pub fn instantiate_all<I, S>(&self, ids: I, ctx: &Arc<RequestContext>) -> Result<Vec<ActionInstance>, DispatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut instances = Vec::new();
        for id in ids {
            match self.instantiate(id.as_ref(), ctx) {
                Ok(instance) => instances.push(instance),
                Err(DispatchError::UnknownAction(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(instances)
    }

    /// Run one action on a worker task and wait for it.
    pub async fn dispatch(&self, instance: ActionInstance) -> Result<(), ActionFailure> {
        let (id, handle) = self.spawn(instance);
        join(id, handle).await
    }

    /// Run independent actions concurrently; returns once every member is done.
    pub async fn dispatch_all(&self, instances: Vec<ActionInstance>) -> BatchReport {
        let handles: Vec<_> = instances.into_iter().map(|i| self.spawn(i)).collect();

        let mut report = BatchReport::default();
        for (id, handle) in handles {
            match join(id.clone(), handle).await {
                Ok(()) => report.completed.push(id),
                Err(failure) => report.failures.push(failure),
            }
        }
        report
    }

    fn spawn(&self, instance: ActionInstance) -> (String, JoinHandle<Result<(), ActionError>>) {
        let permits = Arc::clone(&self.permits);
        let id = instance.id().to_string();
        let request_id = instance.context().request_id().to_string();

        let handle = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|_| ActionError::failed("worker pool closed"))?;

            let start = Instant::now();
            let action = instance.id().to_string();
            let result = instance.run().await;
            tracing::debug!(
                request_id = %request_id,
                action = %action,
                elapsed = ?start.elapsed(),
                ok = result.is_ok(),
                "Action proceeded"
            );
            result
        });

        (id, handle)
    }
}

async fn join(id: String, handle: JoinHandle<Result<(), ActionError>>) -> Result<(), ActionFailure> {
    let cause = match handle.await {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(e)) => FailureCause::Error(e),
        Err(e) if e.is_panic() => FailureCause::Panicked(panic_message(e.into_panic())),
        Err(_) => FailureCause::Cancelled,
    };

    tracing::error!(action = %id, error = %cause, "Action failed");
    metrics::record_action_failure(&id);
    Err(ActionFailure::new(id, cause))
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
