//! Code-forge adapters.

pub mod gh_cli;

pub use gh_cli::{github_repo_slug, GhCliForge};
