//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading (user, project-local and explicit files)
//! - Environment variable overrides
//! - Configuration validation

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, ENV_PREFIX, PROJECT_CONFIG_FILE};
