//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the front
//! controller. All types derive Serde traits for deserialization from TOML.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FrontConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Worker pool for action batches.
    pub dispatcher: DispatcherConfig,

    /// Output formats and templates.
    pub rendering: RenderingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Action identifiers to register at startup.
    pub actions: Vec<String>,

    /// Ordered rewrite rules; the first match wins.
    pub rules: Vec<RuleConfig>,

    /// Nested fragment tree. Nesting decides render order: children render
    /// before their parents.
    pub priority: toml::Table,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Maximum actions running at once across all requests.
    pub max_concurrency: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrency: crate::dispatch::DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// Rendering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderingConfig {
    /// Format used when neither a rule nor the request names one.
    pub default_format: String,

    /// Directory holding page and fragment templates.
    pub templates_dir: String,

    /// Template file extension, without the dot.
    pub template_extension: String,

    /// Path the application is mounted under; `{{ base }}` resolves against it.
    pub uri_root: String,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            default_format: "html".to_string(),
            templates_dir: "templates".to_string(),
            template_extension: "tpl".to_string(),
            uri_root: "/".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest request body read for parameters, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// One rewrite rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Path regex, searched anywhere in the path unless anchored.
    pub pattern: String,

    /// `GET|POST` style method filter; `*` accepts any method.
    #[serde(default = "default_methods")]
    pub methods: String,

    /// Action identifier to run.
    pub action: String,

    /// Parameter names bound to capture groups 1..n.
    #[serde(default)]
    pub substitutions: Vec<String>,

    /// Forced output format.
    #[serde(default)]
    pub format: Option<String>,

    /// Host header to match (case-insensitive).
    #[serde(default)]
    pub host: Option<String>,

    /// Header values that must all be present.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_methods() -> String {
    "*".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: FrontConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.rendering.default_format, "html");
        assert_eq!(config.dispatcher.max_concurrency, 64);
        assert!(config.rules.is_empty());
        assert!(config.priority.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config: FrontConfig = toml::from_str(
            r#"
            actions = ["UserAction", "sidebar"]

            [rendering]
            default_format = "json"

            [[rules]]
            pattern = '^/users/(\d+)$'
            methods = "GET|POST"
            action = "UserAction"
            substitutions = ["id"]
            format = "json"

            [rules.headers]
            x-tenant = "blue"

            [[rules]]
            pattern = "^/$"
            action = "Home"

            [priority.page.sidebar]
            "#,
        )
        .unwrap();

        assert_eq!(config.actions, vec!["UserAction", "sidebar"]);
        assert_eq!(config.rendering.default_format, "json");
        assert_eq!(config.rendering.templates_dir, "templates");
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].substitutions, vec!["id"]);
        assert_eq!(config.rules[0].format.as_deref(), Some("json"));
        assert_eq!(config.rules[0].headers.get("x-tenant").map(String::as_str), Some("blue"));
        assert_eq!(config.rules[1].methods, "*");
        assert!(config.priority["page"].is_table());
    }
}
