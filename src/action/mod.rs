//! Action subsystem.
//!
//! # Data Flow
//! ```text
//! ActionCatalog (identifier → constructor, compiled in)
//!     → dispatch registry builds one prototype per identifier
//!     → each request gets fresh instances bound to its RequestContext
//!     → proceed() runs on a worker task
//! ```
//!
//! # Design Decisions
//! - No reflection: identifiers resolve through an explicit catalog
//! - Instances are built per request, never pooled or cloned
//! - Credential checks use set semantics (required ⊆ held)

pub mod builtin;

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::context::RequestContext;

/// A unit of server-side logic executed for one request.
#[async_trait]
pub trait Action: Send + Sync {
    /// Run the action against its request context.
    async fn proceed(&self, ctx: &RequestContext) -> Result<(), ActionError>;

    /// Credentials required to run this action.
    fn credentials(&self) -> CredentialSet {
        CredentialSet::default()
    }

    /// True when at least one credential is required.
    fn needs_credentials(&self) -> bool {
        !self.credentials().is_empty()
    }

    /// True when every required credential is present in `held`.
    ///
    /// An action with no requirements is always permitted.
    fn has_credentials(&self, held: &CredentialSet) -> bool {
        held.covers(&self.credentials())
    }

    /// False for pure side-effect actions that produce no body.
    fn needs_renderer(&self) -> bool {
        true
    }
}

/// Errors raised from inside an action's unit of work.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action failed with a message.
    #[error("{0}")]
    Failed(String),

    /// A parameter the action depends on was absent.
    #[error("missing parameter `{0}`")]
    MissingParameter(String),

    /// Any other underlying error.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ActionError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// An unordered, duplicate-free set of credential names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet(BTreeSet<String>);

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, credential: impl Into<String>) -> bool {
        self.0.insert(credential.into())
    }

    pub fn contains(&self, credential: &str) -> bool {
        self.0.contains(credential)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when every member of `required` is also in `self`.
    pub fn covers(&self, required: &CredentialSet) -> bool {
        required.0.is_subset(&self.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Parse a comma separated list, ignoring blanks.
    pub fn parse_list(raw: &str) -> Self {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for CredentialSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Guarded;

    #[async_trait]
    impl Action for Guarded {
        async fn proceed(&self, _ctx: &RequestContext) -> Result<(), ActionError> {
            Ok(())
        }

        fn credentials(&self) -> CredentialSet {
            CredentialSet::from_iter(["admin", "editor"])
        }
    }

    struct Open;

    #[async_trait]
    impl Action for Open {
        async fn proceed(&self, _ctx: &RequestContext) -> Result<(), ActionError> {
            Ok(())
        }
    }

    #[test]
    fn test_credentials_use_set_semantics() {
        let action = Guarded;
        assert!(action.needs_credentials());

        let held = CredentialSet::from_iter(["editor", "admin", "admin", "viewer"]);
        assert!(action.has_credentials(&held));

        let partial = CredentialSet::from_iter(["admin"]);
        assert!(!action.has_credentials(&partial));
        assert!(!action.has_credentials(&CredentialSet::new()));
    }

    #[test]
    fn test_no_requirements_always_permitted() {
        let action = Open;
        assert!(!action.needs_credentials());
        assert!(action.has_credentials(&CredentialSet::new()));
        assert!(action.needs_renderer());
    }

    #[test]
    fn test_parse_list() {
        let set = CredentialSet::parse_list(" admin, ,editor,admin ");
        assert_eq!(set.len(), 2);
        assert!(set.contains("admin"));
        assert!(set.contains("editor"));
    }
}
