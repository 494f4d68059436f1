//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (rules reference registered actions)
//! - Validate value ranges (timeouts > 0, worker pool within semaphore limits, addresses parse)
//! - Compile rule patterns and the priority tree ahead of startup
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FrontConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use regex::Regex;
use tokio::sync::Semaphore;

use crate::config::levels::resolve_levels;
use crate::config::schema::FrontConfig;
use crate::routing::matcher::MethodMatcher;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check everything serde cannot.
pub fn validate_config(config: &FrontConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("`{}` is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.dispatcher.max_concurrency == 0 {
        errors.push(ValidationError::new("dispatcher.max_concurrency", "must be greater than 0"));
    } else if config.dispatcher.max_concurrency > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::new(
            "dispatcher.max_concurrency",
            format!("must be at most {}", Semaphore::MAX_PERMITS),
        ));
    }

    if config.rendering.default_format.trim().is_empty() {
        errors.push(ValidationError::new("rendering.default_format", "must not be empty"));
    }

    if !config.rendering.uri_root.starts_with('/') {
        errors.push(ValidationError::new(
            "rendering.uri_root",
            format!("`{}` must start with `/`", config.rendering.uri_root),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    let actions: HashSet<&str> = config.actions.iter().map(String::as_str).collect();
    for (i, rule) in config.rules.iter().enumerate() {
        let field = |name: &str| format!("rules[{i}].{name}");

        if let Err(e) = Regex::new(&rule.pattern) {
            errors.push(ValidationError::new(field("pattern"), e.to_string()));
        }
        if let Err(e) = MethodMatcher::parse(&rule.methods) {
            errors.push(ValidationError::new(field("methods"), e.to_string()));
        }
        if !actions.contains(rule.action.as_str()) {
            errors.push(ValidationError::new(
                field("action"),
                format!("`{}` is not listed in `actions`", rule.action),
            ));
        }
        if rule.format.as_deref().is_some_and(|f| f.trim().is_empty()) {
            errors.push(ValidationError::new(field("format"), "must not be empty when set"));
        }
    }

    if let Err(e) = resolve_levels(&config.priority) {
        errors.push(ValidationError::new("priority", e.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
