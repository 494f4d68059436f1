//! Render level map: depth → fragment names.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::render::fragments::CURRENT;

/// Errors raised while building a level map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    /// Depths start at 1.
    #[error("fragment `{0}` has depth 0; depths start at 1")]
    ZeroDepth(String),

    /// A fragment name may appear in only one bucket.
    #[error("fragment `{name}` appears at depth {first} and again at depth {second}")]
    Duplicate { name: String, first: u32, second: u32 },

    /// CURRENT is rendered before every level and cannot be scheduled.
    #[error("`{CURRENT}` is reserved and cannot be placed in a level")]
    Reserved,
}

/// Fragments grouped by render depth, processed in ascending order.
///
/// Every name belongs to exactly one depth. Names keep their insertion
/// order inside a depth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelMap {
    levels: BTreeMap<u32, Vec<String>>,
    index: HashMap<String, u32>,
}

impl LevelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(depth, names)` pairs.
    pub fn from_levels<I, N, S>(levels: I) -> Result<Self, LevelError>
    where
        I: IntoIterator<Item = (u32, N)>,
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for (depth, names) in levels {
            for name in names {
                map.insert(depth, name)?;
            }
        }
        Ok(map)
    }

    /// Schedule `name` at `depth`.
    pub fn insert(&mut self, depth: u32, name: impl Into<String>) -> Result<(), LevelError> {
        let name = name.into();
        if name == CURRENT {
            return Err(LevelError::Reserved);
        }
        if depth == 0 {
            return Err(LevelError::ZeroDepth(name));
        }
        if let Some(&first) = self.index.get(&name) {
            return Err(LevelError::Duplicate {
                name,
                first,
                second: depth,
            });
        }

        self.index.insert(name.clone(), depth);
        self.levels.entry(depth).or_default().push(name);
        Ok(())
    }

    /// Depths in ascending order with their fragment names.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[String])> {
        self.levels.iter().map(|(depth, names)| (*depth, names.as_slice()))
    }

    pub fn names_at(&self, depth: u32) -> &[String] {
        self.levels.get(&depth).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn depth_of(&self, name: &str) -> Option<u32> {
        self.index.get(name).copied()
    }

    pub fn depths(&self) -> impl Iterator<Item = u32> + '_ {
        self.levels.keys().copied()
    }

    /// Number of scheduled fragments.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
