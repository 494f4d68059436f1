//! Compiled-in action constructors, keyed by identifier.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::action::{Action, ActionError};

/// Builds a fresh, unbound action.
pub type ActionConstructor =
    Arc<dyn Fn() -> Result<Box<dyn Action>, ActionError> + Send + Sync>;

/// Every action type the process knows how to build.
///
/// The dispatcher only registers identifiers that the configuration asks
/// for; the catalog is the universe those identifiers are drawn from.
#[derive(Clone, Default)]
pub struct ActionCatalog {
    constructors: HashMap<String, ActionConstructor>,
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type built through its `Default` impl.
    pub fn with_default<A>(self, id: impl Into<String>) -> Self
    where
        A: Action + Default + 'static,
    {
        self.with_constructor(id, || Ok(Box::new(A::default()) as Box<dyn Action>))
    }

    /// Register a constructor that may fail.
    pub fn with_constructor<F>(mut self, id: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Action>, ActionError> + Send + Sync + 'static,
    {
        self.insert(id, Arc::new(constructor));
        self
    }

    /// Register or replace a constructor.
    pub fn insert(&mut self, id: impl Into<String>, constructor: ActionConstructor) {
        self.constructors.insert(id.into(), constructor);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    pub fn constructor(&self, id: &str) -> Option<&ActionConstructor> {
        self.constructors.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl fmt::Debug for ActionCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.ids().collect();
        ids.sort_unstable();
        f.debug_struct("ActionCatalog").field("ids", &ids).finish()
    }
}
