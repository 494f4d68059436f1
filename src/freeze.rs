//! Build-then-freeze staging for shared registries.
//!
//! # Responsibilities
//! - Hold a mutable build-phase value until `freeze`
//! - Seal it into an immutable `Arc` snapshot exactly once
//! - Reject registrations that arrive after the snapshot exists
//!
//! # Design Decisions
//! - Freezing twice returns the first snapshot unchanged
//! - Late registration is an error value, never a silent no-op
//! - Snapshots expose no mutators, so readers need no locks

use std::sync::Arc;
use thiserror::Error;

/// A registration was attempted on a registry that has already been frozen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{registry} is frozen; registrations are only accepted before freeze")]
pub struct FrozenError {
    /// Name of the frozen registry (for diagnostics).
    pub registry: &'static str,
}

enum Stage<B, S> {
    Open(B),
    Frozen(Arc<S>),
}

/// Two-phase holder: a builder value `B` that becomes a snapshot `S`.
pub(crate) struct Staged<B, S> {
    registry: &'static str,
    stage: Stage<B, S>,
}

impl<B: Default, S> Staged<B, S> {
    pub(crate) fn new(registry: &'static str) -> Self {
        Self {
            registry,
            stage: Stage::Open(B::default()),
        }
    }

    /// Mutable access to the build-phase value.
    pub(crate) fn open_mut(&mut self) -> Result<&mut B, FrozenError> {
        match &mut self.stage {
            Stage::Open(building) => Ok(building),
            Stage::Frozen(_) => Err(FrozenError {
                registry: self.registry,
            }),
        }
    }

    /// Read access to the build-phase value, if still open.
    pub(crate) fn open_ref(&self) -> Option<&B> {
        match &self.stage {
            Stage::Open(building) => Some(building),
            Stage::Frozen(_) => None,
        }
    }

    /// Seal the builder. Later calls return the same snapshot.
    pub(crate) fn freeze_with(&mut self, seal: impl FnOnce(B) -> S) -> Arc<S> {
        let snapshot = match &mut self.stage {
            Stage::Frozen(snapshot) => return Arc::clone(snapshot),
            Stage::Open(building) => Arc::new(seal(std::mem::take(building))),
        };
        tracing::debug!(registry = self.registry, "Registry frozen");
        self.stage = Stage::Frozen(Arc::clone(&snapshot));
        snapshot
    }

    pub(crate) fn is_frozen(&self) -> bool {
        matches!(self.stage, Stage::Frozen(_))
    }
}
