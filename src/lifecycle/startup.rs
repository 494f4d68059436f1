//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile rules into a frozen router
//! - Register action prototypes and freeze the dispatcher
//! - Load templates and freeze the format registry
//! - Assemble the front controller
//!
//! # Design Decisions
//! - Fail fast: invalid rules, priority trees or templates are fatal
//! - Prototype construction failures are not fatal; the action is unknown
//! - The same path serves startup and hot reload

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::config::levels::resolve_levels;
use crate::config::schema::{FrontConfig, RuleConfig};
use crate::config::ConfigError;
use crate::controller::FrontController;
use crate::dispatch::{ActionCatalog, DispatcherBuilder};
use crate::render::{
    FormatRegistryBuilder, JsonRenderer, LeveledRenderer, MainRenderer, TemplateEngine, TemplateStore,
};
use crate::routing::matcher::{AndMatcher, HeaderMatcher, HostMatcher, Matcher};
use crate::routing::{RouteError, RouterBuilder, Rule};

/// Build a controller, loading templates from `rendering.templates_dir`.
///
/// A missing template directory is logged and treated as empty.
pub fn build_controller(config: &FrontConfig, catalog: &ActionCatalog) -> Result<FrontController, ConfigError> {
    let dir = Path::new(&config.rendering.templates_dir);
    let templates = if dir.is_dir() {
        TemplateStore::load_dir(dir, &config.rendering.template_extension)?
    } else {
        tracing::warn!(dir = %dir.display(), "Template directory not found; html pages will not render");
        TemplateStore::new()
    };

    build_controller_with_templates(config, catalog, Arc::new(templates))
}

/// Build a controller around an already loaded template engine.
pub fn build_controller_with_templates(
    config: &FrontConfig,
    catalog: &ActionCatalog,
    templates: Arc<dyn TemplateEngine>,
) -> Result<FrontController, ConfigError> {
    let levels = Arc::new(resolve_levels(&config.priority)?);

    let mut router = RouterBuilder::new();
    for rule in &config.rules {
        router.add_rule(compile_rule(rule)?)?;
    }
    let router = router.freeze();

    // Fragment names double as action identifiers when the catalog has them.
    let mut identifiers: BTreeSet<&str> = config.actions.iter().map(String::as_str).collect();
    identifiers.extend(
        levels
            .iter()
            .flat_map(|(_, names)| names.iter().map(String::as_str))
            .filter(|name| catalog.contains(name)),
    );

    let mut dispatcher = DispatcherBuilder::new(catalog.clone()).max_concurrency(config.dispatcher.max_concurrency);
    dispatcher.register_prototypes(identifiers)?;
    let dispatcher = dispatcher.freeze();

    let mut formats = FormatRegistryBuilder::new();
    formats
        .register_format(
            "html",
            Arc::new(LeveledRenderer::new(dispatcher.clone(), Arc::clone(&levels), templates)),
        )
        .and_then(|f| f.register_format("json", Arc::new(JsonRenderer)))?;
    let formats = formats.freeze();

    let renderer = MainRenderer::new(
        dispatcher.clone(),
        formats,
        Some(config.rendering.default_format.clone()),
    );

    tracing::info!(
        rules = router.len(),
        actions = dispatcher.len(),
        fragments = levels.len(),
        default_format = %config.rendering.default_format,
        "Front controller ready"
    );

    Ok(FrontController::new(router, dispatcher, renderer).with_uri_root(config.rendering.uri_root.as_str()))
}

fn compile_rule(config: &RuleConfig) -> Result<Rule, RouteError> {
    let mut rule = Rule::new(&config.pattern, &config.methods, config.action.as_str())?
        .with_substitutions(config.substitutions.iter().cloned());

    if let Some(format) = &config.format {
        rule = rule.with_format(format.as_str());
    }
    if let Some(host) = &config.host {
        rule = rule.with_guard(HostMatcher::new(host.as_str()));
    }
    if !config.headers.is_empty() {
        let headers = config
            .headers
            .iter()
            .map(|(name, value)| Box::new(HeaderMatcher::new(name.as_str(), value.as_str())) as Box<dyn Matcher>)
            .collect();
        rule = rule.with_guard(AndMatcher::new(headers));
    }

    Ok(rule)
}
