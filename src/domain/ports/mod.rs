//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - VcsClient: enumerates worktrees and repositories, removes worktrees, manages labels
//! - Forge: looks up pull request status for a branch
//!
//! These traits keep the registry services independent of the `git` and `gh`
//! command-line tools.

pub mod forge;
pub mod vcs;

pub use forge::{Forge, PrInfo};
pub use vcs::VcsClient;
