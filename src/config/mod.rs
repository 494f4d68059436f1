//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → levels.rs ([priority] tree → LevelMap)
//!     → FrontConfig (validated, immutable)
//!     → lifecycle::startup builds a frozen FrontController
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new controller built and swapped in atomically
//!     → in-flight requests finish on the old one
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod levels;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::FrontConfig;
pub use schema::ListenerConfig;
pub use schema::RenderingConfig;
pub use schema::RuleConfig;
