//! Infrastructure layer module
//!
//! Adapters and external integrations:
//! - Registry persistence and advisory locking
//! - Git command-line adapter
//! - GitHub CLI forge adapter
//! - Configuration management
//! - Logging infrastructure
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod forge;
pub mod git;
pub mod logging;
pub mod registry;
