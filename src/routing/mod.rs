//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path, headers)
//!     → router.rs (ordered rule scan)
//!     → rule.rs (regex search + method filter + guards)
//!     → matcher.rs (method / host / header predicates)
//!     → Return: action identifier or NoMatch
//!
//! Rule compilation (at startup):
//!     RuleConfig[]
//!     → Compile regexes and method filters
//!     → Append in declaration order
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same rule
//! - First match wins (insertion order)
//! - The router only writes substitutions onto the matched request

pub mod matcher;
pub mod router;
pub mod rule;

use thiserror::Error;

pub use router::{Router, RouterBuilder};
pub use rule::Rule;

/// Errors raised while building the rule list.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The path pattern is not a valid regex.
    #[error("invalid rule pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A method filter entry is not a valid HTTP method.
    #[error("invalid method `{0}` in rule")]
    Method(String),
}
