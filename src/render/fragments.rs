//! Per-request fragment store.

use std::collections::HashMap;

use crate::render::RenderError;

/// Fragment produced from the primary action, rendered before any level.
pub const CURRENT: &str = "__CURRENT__";

/// Rendered fragments of one request, write-once per name.
#[derive(Debug, Clone, Default)]
pub struct FragmentStore {
    fragments: HashMap<String, String>,
    order: Vec<String>,
}

impl FragmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fragment. A name can only be written once per request.
    pub fn insert(&mut self, name: impl Into<String>, body: String) -> Result<(), RenderError> {
        let name = name.into();
        if self.fragments.contains_key(&name) {
            return Err(RenderError::FragmentRewritten(name));
        }
        self.order.push(name.clone());
        self.fragments.insert(name, body);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fragments.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fragments.contains_key(name)
    }

    /// Names in the order they were stored.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
