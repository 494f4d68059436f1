//! Priority tree → render level map.
//!
//! A fragment's depth is its height in the `[priority]` tree: a leaf (any
//! non-table value, or an empty table) has depth 1, and a table has depth
//! one more than its deepest child. Children therefore always render
//! before the fragment that contains them.
//!
//! ```text
//! [priority.page]          page    → 3
//! menu = {}                menu    → 1
//! [priority.page.body]     body    → 2
//! article = {}             article → 1
//! ```

use toml::{Table, Value};

use crate::render::{LevelError, LevelMap, CURRENT};

/// Resolve the `[priority]` table into a level map.
///
/// The `__CURRENT__` key is skipped wherever it appears; CURRENT always
/// renders first.
pub fn resolve_levels(priority: &Table) -> Result<LevelMap, LevelError> {
    let mut levels = LevelMap::new();
    collect(priority, &mut levels)?;
    Ok(levels)
}

/// Adds every entry of `table` and returns the deepest depth among them.
fn collect(table: &Table, levels: &mut LevelMap) -> Result<u32, LevelError> {
    let mut deepest = 0;

    for (name, value) in table {
        if name == CURRENT {
            continue;
        }

        let depth = match value {
            Value::Table(children) => 1 + collect(children, levels)?,
            _ => 1,
        };
        levels.insert(depth, name.as_str())?;
        deepest = deepest.max(depth);
    }

    Ok(deepest)
}
