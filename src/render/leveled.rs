//! Priority-ordered fragment composition.
//!
//! # Responsibilities
//! - Render CURRENT from the primary action's template
//! - For each depth: run that depth's actions as one batch, then render
//!   its fragments
//! - Render the top-level `main` template over every stored fragment
//!
//! # Design Decisions
//! - Fragments of one depth render against the store as it was before the
//!   depth began, so siblings never see each other
//! - A failed batch still renders its surviving members before the error
//!   is returned, keeping them inspectable
//! - Fragment names without a registered action render from their template
//!   alone

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::dispatch::{BatchReport, Dispatcher};
use crate::observability::metrics;
use crate::render::format::FormatRenderer;
use crate::render::fragments::{FragmentStore, CURRENT};
use crate::render::levels::LevelMap;
use crate::render::template::TemplateEngine;
use crate::render::RenderError;

/// Name of the top-level page template.
pub const MAIN_TEMPLATE: &str = "main";

/// Result of a full composition pass.
#[derive(Debug)]
pub struct Composition {
    pub fragments: FragmentStore,
    pub body: String,
}

/// The `html` format: level-ordered dispatch and fragment rendering.
pub struct LeveledRenderer {
    dispatcher: Dispatcher,
    levels: Arc<LevelMap>,
    templates: Arc<dyn TemplateEngine>,
}

impl LeveledRenderer {
    pub fn new(dispatcher: Dispatcher, levels: Arc<LevelMap>, templates: Arc<dyn TemplateEngine>) -> Self {
        Self {
            dispatcher,
            levels,
            templates,
        }
    }

    pub fn levels(&self) -> &LevelMap {
        &self.levels
    }

    /// Run every level and assemble the page.
    pub async fn compose(&self, ctx: &Arc<RequestContext>) -> Result<Composition, RenderError> {
        let mut store = FragmentStore::new();

        if let Some(action) = ctx.action() {
            if self.templates.contains(&action) {
                let current = self.templates.render(&action, ctx, &store)?;
                store.insert(CURRENT, current)?;
            }
        }

        for (depth, names) in self.levels.iter() {
            let instances = self.dispatcher.instantiate_all(names, ctx)?;
            let report = self.dispatcher.dispatch_all(instances).await;

            tracing::debug!(
                request_id = %ctx.request_id(),
                depth,
                fragments = names.len(),
                failed = report.failures.len(),
                "Level dispatched"
            );

            if report.is_success() {
                let rendered = self.render_level(names, ctx, &store)?;
                store_level(&mut store, rendered)?;
                continue;
            }

            let survivors = self.render_survivors(names, &report, ctx, &store);
            store_level(&mut store, survivors)?;
            return Err(RenderError::action_failed(report.failures, store));
        }

        let body = self.templates.render(MAIN_TEMPLATE, ctx, &store)?;
        Ok(Composition {
            fragments: store,
            body,
        })
    }

    fn render_level(
        &self,
        names: &[String],
        ctx: &RequestContext,
        store: &FragmentStore,
    ) -> Result<Vec<(String, String)>, RenderError> {
        names
            .iter()
            .map(|name| Ok::<_, RenderError>((name.clone(), self.templates.render(name, ctx, store)?)))
            .collect()
    }

    fn render_survivors(
        &self,
        names: &[String],
        report: &BatchReport,
        ctx: &RequestContext,
        store: &FragmentStore,
    ) -> Vec<(String, String)> {
        names
            .iter()
            .filter(|name| !report.failed(name))
            .filter_map(|name| match self.templates.render(name, ctx, store) {
                Ok(body) => Some((name.clone(), body)),
                Err(e) => {
                    tracing::warn!(
                        request_id = %ctx.request_id(),
                        fragment = %name,
                        error = %e,
                        "Surviving fragment did not render; dropping it"
                    );
                    None
                }
            })
            .collect()
    }
}

fn store_level(store: &mut FragmentStore, rendered: Vec<(String, String)>) -> Result<(), RenderError> {
    let count = rendered.len();
    for (name, body) in rendered {
        store.insert(name, body)?;
    }
    metrics::record_fragments_rendered(count);
    Ok(())
}

#[async_trait]
impl FormatRenderer for LeveledRenderer {
    async fn render(&self, ctx: &Arc<RequestContext>) -> Result<String, RenderError> {
        Ok(self.compose(ctx).await?.body)
    }

    fn mime_type(&self) -> &str {
        "text/html; charset=utf-8"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionError};
    use crate::dispatch::{ActionCatalog, DispatcherBuilder, FailureCause};
    use crate::render::template::{TemplateError, TemplateStore};
    use axum::http::Method;

    #[derive(Default)]
    struct Sidebar;

    #[async_trait]
    impl Action for Sidebar {
        async fn proceed(&self, ctx: &RequestContext) -> Result<(), ActionError> {
            ctx.set_attribute("links", "home|about");
            Ok(())
        }
    }

    #[derive(Default)]
    struct Broken;

    #[async_trait]
    impl Action for Broken {
        async fn proceed(&self, _ctx: &RequestContext) -> Result<(), ActionError> {
            Err(ActionError::failed("database unavailable"))
        }
    }

    fn dispatcher() -> Dispatcher {
        let catalog = ActionCatalog::new()
            .with_default::<Sidebar>("sidebar")
            .with_default::<Broken>("broken");
        let mut builder = DispatcherBuilder::new(catalog);
        builder.register_prototypes(["sidebar", "broken"]).unwrap();
        builder.freeze()
    }

    fn request() -> Arc<RequestContext> {
        let ctx = RequestContext::builder(Method::GET, "/").build();
        ctx.set_action("Home");
        Arc::new(ctx)
    }

    #[tokio::test]
    async fn test_current_and_sidebar_then_main_once() {
        let templates = Arc::new(
            TemplateStore::new()
                .with("Home", "welcome")
                .unwrap()
                .with("sidebar", "<aside>{{ attr:links }}</aside>")
                .unwrap()
                .with("main", "{{ fragment:sidebar }}<main>{{ fragment:__CURRENT__ }}</main>")
                .unwrap(),
        );
        let levels = LevelMap::from_levels([(1, ["sidebar"])]).unwrap();
        let renderer = LeveledRenderer::new(dispatcher(), Arc::new(levels), templates.clone());

        let composition = renderer.compose(&request()).await.unwrap();

        let mut names: Vec<&str> = composition.fragments.names().collect();
        names.sort_unstable();
        assert_eq!(names, vec![CURRENT, "sidebar"]);
        assert_eq!(composition.body, "<aside>home|about</aside><main>welcome</main>");
        assert_eq!(templates.render_count("main"), 1);
    }

    #[tokio::test]
    async fn test_inner_depth_visible_to_outer() {
        let templates = Arc::new(
            TemplateStore::new()
                .with("a", "A")
                .unwrap()
                .with("b", "[{{ fragment:a }}]")
                .unwrap()
                .with("main", "{{ fragment:b }}")
                .unwrap(),
        );
        let levels = LevelMap::from_levels([(1, ["a"]), (2, ["b"])]).unwrap();
        let renderer = LeveledRenderer::new(dispatcher(), Arc::new(levels), templates);

        for _ in 0..10 {
            let composition = renderer.compose(&request()).await.unwrap();
            assert_eq!(composition.body, "[A]");
        }
    }

    #[tokio::test]
    async fn test_siblings_cannot_see_each_other() {
        let templates = Arc::new(
            TemplateStore::new()
                .with("a", "A")
                .unwrap()
                .with("b", "{{ fragment:a }}")
                .unwrap()
                .with("main", "")
                .unwrap(),
        );
        let levels = LevelMap::from_levels([(1, ["a", "b"])]).unwrap();
        let renderer = LeveledRenderer::new(dispatcher(), Arc::new(levels), templates);

        let err = renderer.compose(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            RenderError::Template(TemplateError::MissingFragment { ref fragment, .. }) if fragment == "a"
        ));
    }

    #[tokio::test]
    async fn test_failed_member_keeps_survivors() {
        let templates = Arc::new(
            TemplateStore::new()
                .with("sidebar", "side")
                .unwrap()
                .with("broken", "never")
                .unwrap()
                .with("footer", "foot")
                .unwrap()
                .with("page", "{{ fragment:sidebar }}")
                .unwrap()
                .with("main", "{{ fragment:page }}")
                .unwrap(),
        );
        let levels = LevelMap::from_levels([(1, vec!["sidebar", "broken", "footer"]), (2, vec!["page"])]).unwrap();
        let renderer = LeveledRenderer::new(dispatcher(), Arc::new(levels), templates.clone());

        let err = renderer.compose(&request()).await.unwrap_err();
        let RenderError::ActionFailed { failures, partial } = err else {
            panic!("expected an action failure");
        };

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].action, "broken");
        assert!(matches!(failures[0].cause, FailureCause::Error(_)));
        assert_eq!(partial.get("sidebar"), Some("side"));
        assert_eq!(partial.get("footer"), Some("foot"));
        assert!(!partial.contains("broken"));
        assert!(!partial.contains("page"));
        assert_eq!(templates.render_count("main"), 0);
    }

    #[tokio::test]
    async fn test_unrenderable_survivor_is_dropped() {
        let templates = Arc::new(
            TemplateStore::new()
                .with("sidebar", "side")
                .unwrap()
                .with("footer", "{{ fragment:missing }}")
                .unwrap()
                .with("main", "")
                .unwrap(),
        );
        let levels = LevelMap::from_levels([(1, ["sidebar", "broken", "footer"])]).unwrap();
        let renderer = LeveledRenderer::new(dispatcher(), Arc::new(levels), templates);

        let err = renderer.compose(&request()).await.unwrap_err();
        let RenderError::ActionFailed { failures, partial } = err else {
            panic!("expected an action failure");
        };

        assert_eq!(failures.len(), 1);
        assert_eq!(partial.get("sidebar"), Some("side"));
        assert!(!partial.contains("footer"));
    }

    #[tokio::test]
    async fn test_no_current_without_action_template() {
        let templates = Arc::new(TemplateStore::new().with("main", "plain").unwrap());
        let renderer = LeveledRenderer::new(dispatcher(), Arc::new(LevelMap::new()), templates);

        let composition = renderer.compose(&request()).await.unwrap();
        assert!(composition.fragments.is_empty());
        assert_eq!(renderer.mime_type(), "text/html; charset=utf-8");
        assert_eq!(renderer.render(&request()).await.unwrap(), "plain");
    }
}
