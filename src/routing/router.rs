//! Rule lookup.
//!
//! # Responsibilities
//! - Collect rules in insertion order during the build phase
//! - Freeze them into an immutable, shareable `Router`
//! - Resolve a request to the first matching rule's action
//!
//! # Design Decisions
//! - Immutable after freeze (thread-safe without locks)
//! - O(n) scan in insertion order; first match returns immediately
//! - Explicit no-match (`None`) rather than a silent default

use std::sync::Arc;

use crate::context::RequestContext;
use crate::freeze::{FrozenError, Staged};
use crate::routing::rule::Rule;

/// Build-phase rule list.
pub struct RouterBuilder {
    rules: Staged<Vec<Rule>, Vec<Rule>>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            rules: Staged::new("rule list"),
        }
    }

    /// Append a rule. Fails once the router has been frozen.
    pub fn add_rule(&mut self, rule: Rule) -> Result<&mut Self, FrozenError> {
        self.rules.open_mut()?.push(rule);
        Ok(self)
    }

    /// Append several rules, keeping their order.
    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = Rule>) -> Result<&mut Self, FrozenError> {
        self.rules.open_mut()?.extend(rules);
        Ok(self)
    }

    /// Seal the rule list. Calling this again returns the same router.
    pub fn freeze(&mut self) -> Router {
        let rules = self.rules.freeze_with(|rules| {
            tracing::info!(rules = rules.len(), "Rule list frozen");
            rules
        });
        Router { rules }
    }

    pub fn is_frozen(&self) -> bool {
        self.rules.is_frozen()
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen, ordered rule list shared by every request.
#[derive(Debug, Clone)]
pub struct Router {
    rules: Arc<Vec<Rule>>,
}

impl Router {
    /// Resolve the request to an action identifier.
    ///
    /// On a match the rule's substitutions are written as request parameters,
    /// the action identifier is recorded on the context, and a forced format
    /// (if any) replaces the declared one.
    pub fn resolve(&self, ctx: &RequestContext) -> Option<&str> {
        for rule in self.rules.iter() {
            let Some(bindings) = rule.bindings(ctx) else {
                continue;
            };

            for (name, value) in bindings {
                ctx.set_param(name, vec![value]);
            }
            ctx.set_action(rule.action());
            if let Some(format) = rule.format() {
                ctx.set_format(format);
            }

            tracing::debug!(
                request_id = %ctx.request_id(),
                path = %ctx.path(),
                pattern = %rule.pattern(),
                action = %rule.action(),
                "Rule matched"
            );
            return Some(rule.action());
        }
        None
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
