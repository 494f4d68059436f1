//! Rewrite rules.
//!
//! # Responsibilities
//! - Test a request path against a regex (unanchored search, like a find)
//! - Filter by method and optional extra guards
//! - Produce parameter substitutions from capture groups
//!
//! # Design Decisions
//! - Substitutions are computed here but written by the router, and only
//!   for the winning rule
//! - Captured groups are percent-decoded before binding
//! - Groups that did not participate in the match bind nothing

use regex::Regex;

use crate::context::params::decode_component;
use crate::context::RequestContext;
use crate::routing::matcher::{Matcher, MethodMatcher};
use crate::routing::RouteError;

/// One entry of the ordered rule list.
#[derive(Debug)]
pub struct Rule {
    pattern: Regex,
    methods: MethodMatcher,
    action: String,
    substitutions: Vec<String>,
    format: Option<String>,
    guards: Vec<Box<dyn Matcher>>,
}

impl Rule {
    /// Create a rule from a path regex, a method filter and an action identifier.
    pub fn new(pattern: &str, methods: &str, action: impl Into<String>) -> Result<Self, RouteError> {
        let regex = Regex::new(pattern).map_err(|source| RouteError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            pattern: regex,
            methods: MethodMatcher::parse(methods)?,
            action: action.into(),
            substitutions: Vec::new(),
            format: None,
            guards: Vec::new(),
        })
    }

    /// Bind capture group `i + 1` to `names[i]`.
    pub fn with_substitutions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.substitutions = names.into_iter().map(Into::into).collect();
        self
    }

    /// Force the output format when this rule wins.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Add an extra condition checked after path and method.
    pub fn with_guard(mut self, guard: impl Matcher + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Returns the parameter bindings when the rule matches, `None` otherwise.
    pub fn bindings(&self, ctx: &RequestContext) -> Option<Vec<(String, String)>> {
        let captures = self.pattern.captures(ctx.path())?;

        if !self.methods.matches(ctx) || !self.guards.iter().all(|g| g.matches(ctx)) {
            return None;
        }

        let bound = self
            .substitutions
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                captures
                    .get(i + 1)
                    .map(|m| (name.clone(), decode_component(m.as_str())))
            })
            .collect();

        Some(bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::matcher::HostMatcher;
    use axum::http::Method;

    fn ctx(method: Method, path: &str) -> RequestContext {
        RequestContext::builder(method, path).build()
    }

    #[test]
    fn test_bindings_from_groups() {
        let rule = Rule::new(r"^/users/(\d+)/posts/([^/]+)$", "GET", "PostAction")
            .unwrap()
            .with_substitutions(["user", "slug"]);

        let bound = rule.bindings(&ctx(Method::GET, "/users/7/posts/hello%20world")).unwrap();
        assert_eq!(
            bound,
            vec![
                ("user".to_string(), "7".to_string()),
                ("slug".to_string(), "hello world".to_string()),
            ]
        );
    }

    #[test]
    fn test_unanchored_search() {
        let rule = Rule::new("/admin", "*", "AdminAction").unwrap();
        assert!(rule.bindings(&ctx(Method::GET, "/site/admin/panel")).is_some());
    }

    #[test]
    fn test_method_and_guard_filter() {
        let rule = Rule::new("^/$", "POST", "Home").unwrap();
        assert!(rule.bindings(&ctx(Method::GET, "/")).is_none());

        let guarded = Rule::new("^/$", "*", "Home")
            .unwrap()
            .with_guard(HostMatcher::new("internal"));
        assert!(guarded.bindings(&ctx(Method::GET, "/")).is_none());
    }

    #[test]
    fn test_optional_group_binds_nothing() {
        let rule = Rule::new(r"^/list(?:/(\d+))?$", "*", "List")
            .unwrap()
            .with_substitutions(["page", "unused"]);
        assert!(rule.bindings(&ctx(Method::GET, "/list")).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Rule::new("(unclosed", "*", "X").unwrap_err();
        assert!(matches!(err, RouteError::Pattern { .. }));
    }
}
