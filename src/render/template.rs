//! Template engine for fragment and page rendering.
//!
//! # Responsibilities
//! - Load `<name>.<ext>` templates from a directory tree
//! - Parse placeholders once, at load time
//! - Render a template against a request and the fragments stored so far
//!
//! # Placeholders
//! - `{{ fragment:NAME }}`: a stored fragment; absence is an error
//! - `{{ param:NAME }}`: first value of a request parameter
//! - `{{ attr:NAME }}`: an attribute set by an action
//! - `{{ status }}`, `{{ action }}`
//! - `{{ base }}`: absolute application root, or the root path without a Host header
//!
//! # Design Decisions
//! - Templates are immutable once loaded; the store is shared through `Arc`
//! - A missing fragment fails loudly so render ordering bugs surface
//! - Missing parameters and attributes render as empty text

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde_json::Value;
use thiserror::Error;

use crate::context::RequestContext;
use crate::render::fragments::FragmentStore;

/// Errors raised while loading or rendering templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{0}` not found")]
    NotFound(String),

    /// A template read a fragment that has not been stored.
    #[error("template `{template}` reads fragment `{fragment}`, which has not been rendered")]
    MissingFragment { template: String, fragment: String },

    #[error("template `{template}` has unknown placeholder `{{{{ {placeholder} }}}}`")]
    Placeholder { template: String, placeholder: String },

    #[error("failed to read templates from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders named templates.
pub trait TemplateEngine: Send + Sync {
    fn render(&self, name: &str, ctx: &RequestContext, fragments: &FragmentStore) -> Result<String, TemplateError>;

    fn contains(&self, name: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Fragment(String),
    Param(String),
    Attr(String),
    Status,
    Action,
    Base,
}

impl Segment {
    fn parse(template: &str, inner: &str) -> Result<Self, TemplateError> {
        let segment = match inner.split_once(':') {
            Some((kind, name)) => {
                let name = name.trim().to_string();
                match kind.trim() {
                    "fragment" => Segment::Fragment(name),
                    "param" => Segment::Param(name),
                    "attr" => Segment::Attr(name),
                    _ => return Err(unknown(template, inner)),
                }
            }
            None => match inner {
                "status" => Segment::Status,
                "action" => Segment::Action,
                "base" => Segment::Base,
                _ => return Err(unknown(template, inner)),
            },
        };
        Ok(segment)
    }
}

fn unknown(template: &str, placeholder: &str) -> TemplateError {
    TemplateError::Placeholder {
        template: template.to_string(),
        placeholder: placeholder.to_string(),
    }
}

#[derive(Debug)]
struct Template {
    segments: Vec<Segment>,
    size_hint: usize,
}

impl Template {
    fn parse(name: &str, source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(open) = rest.find("{{") {
            let Some(len) = rest[open + 2..].find("}}") else {
                break;
            };
            if open > 0 {
                segments.push(Segment::Text(rest[..open].to_string()));
            }
            let inner = rest[open + 2..open + 2 + len].trim();
            segments.push(Segment::parse(name, inner)?);
            rest = &rest[open + len + 4..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest.to_string()));
        }

        Ok(Self {
            segments,
            size_hint: source.len(),
        })
    }
}

/// In-memory templates plus per-template render counts.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: HashMap<String, Template>,
    renders: DashMap<String, usize>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and add a template, replacing one of the same name.
    pub fn insert(&mut self, name: impl Into<String>, source: &str) -> Result<(), TemplateError> {
        let name = name.into();
        let template = Template::parse(&name, source)?;
        self.templates.insert(name, template);
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, source: &str) -> Result<Self, TemplateError> {
        self.insert(name, source)?;
        Ok(self)
    }

    /// Load every `*.{extension}` file under `dir`.
    ///
    /// A file at `dir/users/show.tpl` is named `users/show`.
    pub fn load_dir(dir: &Path, extension: &str) -> Result<Self, TemplateError> {
        let mut store = Self::new();
        store.load_tree(dir, dir, extension)?;
        tracing::info!(
            dir = %dir.display(),
            templates = store.templates.len(),
            "Templates loaded"
        );
        Ok(store)
    }

    fn load_tree(&mut self, root: &Path, dir: &Path, extension: &str) -> Result<(), TemplateError> {
        let io = |source| TemplateError::Io {
            path: dir.to_path_buf(),
            source,
        };

        for entry in fs::read_dir(dir).map_err(io)? {
            let path = entry.map_err(io)?.path();
            if path.is_dir() {
                self.load_tree(root, &path, extension)?;
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }

            let source = fs::read_to_string(&path).map_err(|source| TemplateError::Io {
                path: path.clone(),
                source,
            })?;
            let name = template_name(root, &path);
            tracing::debug!(template = %name, "Template parsed");
            self.insert(name, &source)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// How many times `name` has been rendered.
    pub fn render_count(&self, name: &str) -> usize {
        self.renders.get(name).map(|n| *n).unwrap_or(0)
    }
}

fn template_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl TemplateEngine for TemplateStore {
    fn render(&self, name: &str, ctx: &RequestContext, fragments: &FragmentStore) -> Result<String, TemplateError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        *self.renders.entry(name.to_string()).or_insert(0) += 1;

        let mut out = String::with_capacity(template.size_hint);
        for segment in &template.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Fragment(fragment) => {
                    let body = fragments.get(fragment).ok_or_else(|| TemplateError::MissingFragment {
                        template: name.to_string(),
                        fragment: fragment.clone(),
                    })?;
                    out.push_str(body);
                }
                Segment::Param(key) => {
                    if let Some(value) = ctx.param(key) {
                        out.push_str(&value);
                    }
                }
                Segment::Attr(key) => match ctx.attribute(key) {
                    Some(Value::String(s)) => out.push_str(&s),
                    Some(Value::Null) | None => {}
                    Some(other) => out.push_str(&other.to_string()),
                },
                Segment::Status => out.push_str(ctx.status().as_str()),
                Segment::Action => {
                    if let Some(action) = ctx.action() {
                        out.push_str(&action);
                    }
                }
                Segment::Base => match ctx.request_base() {
                    Some(base) => out.push_str(&base),
                    None => out.push_str(ctx.uri_root()),
                },
            }
        }
        Ok(out)
    }

    fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }
}
