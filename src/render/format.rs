//! Output format renderers and their frozen registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::freeze::{FrozenError, Staged};
use crate::render::RenderError;

/// Serializes a request's result into a response body.
#[async_trait]
pub trait FormatRenderer: Send + Sync {
    async fn render(&self, ctx: &Arc<RequestContext>) -> Result<String, RenderError>;

    fn mime_type(&self) -> &str;
}

type Formats = HashMap<String, Arc<dyn FormatRenderer>>;

/// Build-phase format registry.
pub struct FormatRegistryBuilder {
    formats: Staged<Formats, Formats>,
}

impl FormatRegistryBuilder {
    pub fn new() -> Self {
        Self {
            formats: Staged::new("format registry"),
        }
    }

    /// Register a renderer under a format name, replacing any previous one.
    pub fn register_format(
        &mut self,
        name: impl Into<String>,
        renderer: Arc<dyn FormatRenderer>,
    ) -> Result<&mut Self, FrozenError> {
        self.formats.open_mut()?.insert(name.into(), renderer);
        Ok(self)
    }

    /// Seal the registry. Calling this again returns the same registry.
    pub fn freeze(&mut self) -> FormatRegistry {
        let formats = self.formats.freeze_with(|formats| {
            tracing::info!(formats = ?formats.keys().collect::<Vec<_>>(), "Format registry frozen");
            formats
        });
        FormatRegistry { formats }
    }
}

impl Default for FormatRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen format name → renderer map.
#[derive(Clone)]
pub struct FormatRegistry {
    formats: Arc<Formats>,
}

impl FormatRegistry {
    pub fn get(&self, name: &str) -> Option<&Arc<dyn FormatRenderer>> {
        self.formats.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formats.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry").field("formats", &self.names()).finish()
    }
}
