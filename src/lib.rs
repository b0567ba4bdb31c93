//! Arbor - stable numeric IDs for git worktrees
//!
//! Arbor keeps a small JSON registry next to a directory of git worktrees and
//! hands every worktree a short integer ID that survives branch renames,
//! directory moves and restarts. Commands then accept `3`, `feat/x`,
//! `api:feat/x` or nothing at all (the current directory) as a target.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): registry model, errors and the VCS / forge ports
//! - **Service Layer** (`services`): sync, target resolution and PR refresh
//! - **Infrastructure Layer** (`infrastructure`): registry file and lock, git
//!   and GitHub CLI adapters, configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use arbor::domain::models::{LiveWorktree, Registry};
//! use arbor::services::sync_worktrees;
//!
//! let mut registry = Registry::new();
//! let live = vec![LiveWorktree::new("/wt/api-x", "/code/api", "x", "")];
//! let ids = sync_worktrees(&mut registry, &live);
//! assert_eq!(ids.values().copied().collect::<Vec<_>>(), vec![1]);
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, LiveWorktree, PrStatus, Registry, RepoInfo, ResolveContext, Target, WorktreeEntry,
};
pub use domain::ports::{Forge, PrInfo, VcsClient};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::registry::{RegistryLock, RegistryStore};
pub use services::{
    sync_worktrees, PrRefresher, RefreshConfig, RefreshSummary, SyncReport, TargetResolver,
};
