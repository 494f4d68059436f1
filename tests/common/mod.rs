//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use serde_json::json;

use front_controller::action::{builtin, Action, ActionError, CredentialSet};
use front_controller::config::{parse_config, FrontConfig};
use front_controller::context::RequestContext;
use front_controller::dispatch::ActionCatalog;
use front_controller::lifecycle::build_controller_with_templates;
use front_controller::render::TemplateStore;
use front_controller::FrontController;

/// Rules and actions shared by every fixture config.
pub const BASE_CONFIG: &str = r#"
actions = ["UserAction", "AdminAction", "Home", "Echo", "Ghost", "RedirectAction", "StatusAction"]

[rendering]
default_format = "html"
templates_dir = "/nonexistent/templates"

[[rules]]
pattern = '^/users/(\d+)$'
methods = "GET"
action = "UserAction"
substitutions = ["id"]
format = "json"

[[rules]]
pattern = "^/admin"
action = "AdminAction"
format = "json"

[[rules]]
pattern = "^/$"
action = "Home"

[[rules]]
pattern = "^/echo$"
action = "Echo"

[[rules]]
pattern = "^/ghost$"
action = "Ghost"

[[rules]]
pattern = "^/go$"
action = "RedirectAction"
"#;

/// Publishes `{ "id": <id> }` for the `id` parameter.
#[derive(Default)]
pub struct UserAction;

#[async_trait]
impl Action for UserAction {
    async fn proceed(&self, ctx: &RequestContext) -> Result<(), ActionError> {
        let id = ctx
            .param("id")
            .ok_or_else(|| ActionError::MissingParameter("id".into()))?;
        ctx.set_attribute("model", json!({ "id": id }));
        Ok(())
    }
}

/// Requires the `admin` credential.
#[derive(Default)]
pub struct AdminAction;

#[async_trait]
impl Action for AdminAction {
    async fn proceed(&self, ctx: &RequestContext) -> Result<(), ActionError> {
        ctx.set_attribute("model", json!({ "admin": true }));
        Ok(())
    }

    fn credentials(&self) -> CredentialSet {
        CredentialSet::from_iter(["admin"])
    }
}

#[derive(Default)]
pub struct HomeAction;

#[async_trait]
impl Action for HomeAction {
    async fn proceed(&self, _ctx: &RequestContext) -> Result<(), ActionError> {
        Ok(())
    }
}

/// Fragment action for `sidebar`.
#[derive(Default)]
pub struct SidebarAction;

#[async_trait]
impl Action for SidebarAction {
    async fn proceed(&self, ctx: &RequestContext) -> Result<(), ActionError> {
        ctx.set_attribute("links", "home|about");
        Ok(())
    }
}

/// Fragment action for `broken`.
#[derive(Default)]
pub struct FailingAction;

#[async_trait]
impl Action for FailingAction {
    async fn proceed(&self, _ctx: &RequestContext) -> Result<(), ActionError> {
        Err(ActionError::failed("backing store unavailable"))
    }
}

/// Fragment action for `greeting`; yields so concurrent requests interleave.
#[derive(Default)]
pub struct GreetingAction;

#[async_trait]
impl Action for GreetingAction {
    async fn proceed(&self, ctx: &RequestContext) -> Result<(), ActionError> {
        let who = ctx.param_or("who", "nobody");
        tokio::task::yield_now().await;
        ctx.set_attribute("greeting", format!("hello {who}"));
        Ok(())
    }
}

/// Built-in actions plus the fixtures above.
pub fn catalog() -> ActionCatalog {
    builtin::catalog()
        .with_default::<UserAction>("UserAction")
        .with_default::<AdminAction>("AdminAction")
        .with_default::<HomeAction>("Home")
        .with_default::<HomeAction>("Echo")
        .with_default::<SidebarAction>("sidebar")
        .with_default::<FailingAction>("broken")
        .with_default::<GreetingAction>("greeting")
}

/// Base config with an extra `[priority]` body appended.
pub fn config(priority: &str) -> FrontConfig {
    let source = if priority.is_empty() {
        BASE_CONFIG.to_string()
    } else {
        format!("{BASE_CONFIG}\n[priority]\n{priority}\n")
    };
    parse_config(&source).expect("fixture config is valid")
}

/// Templates from `(name, source)` pairs.
pub fn templates(entries: &[(&str, &str)]) -> Arc<TemplateStore> {
    let mut store = TemplateStore::new();
    for (name, source) in entries {
        store.insert(*name, source).expect("fixture template parses");
    }
    Arc::new(store)
}

pub fn controller(priority: &str, templates: Arc<TemplateStore>) -> FrontController {
    build_controller_with_templates(&config(priority), &catalog(), templates).expect("fixture controller builds")
}

/// A request for `uri`, splitting off the query string.
pub fn request(method: Method, uri: &str) -> Arc<RequestContext> {
    Arc::new(request_with(method, uri, CredentialSet::new()))
}

pub fn request_with(method: Method, uri: &str, credentials: CredentialSet) -> RequestContext {
    let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
    RequestContext::builder(method, path)
        .query(query)
        .credentials(credentials)
        .build()
}
