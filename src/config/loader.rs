//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::FrontConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::freeze::FrozenError;
use crate::render::{LevelError, TemplateError};
use crate::routing::RouteError;

/// Error type for configuration loading and controller assembly.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
    Levels(LevelError),
    Route(RouteError),
    Template(TemplateError),
    Frozen(FrozenError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::Levels(e) => write!(f, "Priority error: {}", e),
            ConfigError::Route(e) => write!(f, "Rule error: {}", e),
            ConfigError::Template(e) => write!(f, "Template error: {}", e),
            ConfigError::Frozen(e) => write!(f, "Registry error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
            ConfigError::Levels(e) => Some(e),
            ConfigError::Route(e) => Some(e),
            ConfigError::Template(e) => Some(e),
            ConfigError::Frozen(e) => Some(e),
        }
    }
}

impl From<LevelError> for ConfigError {
    fn from(e: LevelError) -> Self {
        ConfigError::Levels(e)
    }
}

impl From<RouteError> for ConfigError {
    fn from(e: RouteError) -> Self {
        ConfigError::Route(e)
    }
}

impl From<TemplateError> for ConfigError {
    fn from(e: TemplateError) -> Self {
        ConfigError::Template(e)
    }
}

impl From<FrozenError> for ConfigError {
    fn from(e: FrozenError) -> Self {
        ConfigError::Frozen(e)
    }
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<FrontConfig, ConfigError> {
    let config: FrontConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<FrontConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let config = parse_config(
            r#"
            actions = ["StatusAction"]
            [[rules]]
            pattern = "^/status$"
            action = "StatusAction"
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.rules.len(), 1);
    }

    #[test]
    fn test_frozen_registry_is_not_a_rule_error() {
        let err = ConfigError::from(FrozenError {
            registry: "format registry",
        });
        assert!(matches!(err, ConfigError::Frozen(ref e) if e.registry == "format registry"));
        assert!(err.to_string().starts_with("Registry error: format registry is frozen"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("actions = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Parse error"));
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let err = parse_config(
            r#"
            [[rules]]
            pattern = "^/$"
            action = "Missing"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("rules[0].action"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/no/such/front.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
