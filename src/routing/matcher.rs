//! Request predicates used by rules.
//!
//! # Responsibilities
//! - Filter on HTTP method (`GET|POST`, `*`)
//! - Match the Host header (exact, case-insensitive)
//! - Match a header value (exact)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - A method filter of `*` or empty matches every method
//! - Matchers are pure: they never write to the context

use axum::http::Method;

use crate::context::RequestContext;
use crate::routing::RouteError;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, ctx: &RequestContext) -> bool;
}

/// Accepts a fixed set of methods, or every method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodMatcher {
    Any,
    OneOf(Vec<Method>),
}

impl MethodMatcher {
    /// Parse a `|` separated method list. `*` (or nothing) means any method.
    pub fn parse(spec: &str) -> Result<Self, RouteError> {
        let spec = spec.trim();
        if spec.is_empty() || spec == "*" {
            return Ok(Self::Any);
        }

        spec.split('|')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(|m| {
                Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                    .map_err(|_| RouteError::Method(m.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::OneOf)
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, ctx: &RequestContext) -> bool {
        match self {
            Self::Any => true,
            Self::OneOf(methods) => methods.iter().any(|m| m == ctx.method()),
        }
    }
}

/// Matches the Host header.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, ctx: &RequestContext) -> bool {
        ctx.header("host")
            .map(|h| h.to_lowercase() == self.expected_host)
            .unwrap_or(false)
    }
}

/// Matches an exact header value.
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
    name: String,
    value: String,
}

impl HeaderMatcher {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            value: value.into(),
        }
    }
}

impl Matcher for HeaderMatcher {
    fn matches(&self, ctx: &RequestContext) -> bool {
        ctx.header(&self.name) == Some(self.value.as_str())
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, ctx: &RequestContext) -> bool {
        self.matchers.iter().all(|m| m.matches(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(method: Method) -> RequestContext {
        RequestContext::builder(method, "/")
            .header("Host", "EXAMPLE.com")
            .header("x-tenant", "blue")
            .build()
    }

    #[test]
    fn test_method_matcher() {
        let matcher = MethodMatcher::parse("GET|post").unwrap();
        assert!(matcher.matches(&ctx(Method::GET)));
        assert!(matcher.matches(&ctx(Method::POST)));
        assert!(!matcher.matches(&ctx(Method::DELETE)));

        let any = MethodMatcher::parse("*").unwrap();
        assert_eq!(any, MethodMatcher::Any);
        assert!(any.matches(&ctx(Method::PATCH)));
    }

    #[test]
    fn test_method_matcher_rejects_garbage() {
        assert!(matches!(
            MethodMatcher::parse("GET|B@D"),
            Err(RouteError::Method(ref m)) if m == "B@D"
        ));
    }

    #[test]
    fn test_host_matcher() {
        assert!(HostMatcher::new("example.com").matches(&ctx(Method::GET)));
        assert!(!HostMatcher::new("other.com").matches(&ctx(Method::GET)));
    }

    #[test]
    fn test_and_matcher() {
        let both = AndMatcher::new(vec![
            Box::new(HostMatcher::new("example.com")),
            Box::new(HeaderMatcher::new("X-Tenant", "blue")),
        ]);
        assert!(both.matches(&ctx(Method::GET)));

        let mismatch = AndMatcher::new(vec![
            Box::new(HostMatcher::new("example.com")),
            Box::new(HeaderMatcher::new("x-tenant", "green")),
        ]);
        assert!(!mismatch.matches(&ctx(Method::GET)));
    }
}
