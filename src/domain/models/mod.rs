pub mod config;
pub mod registry;
pub mod worktree;

pub use config::{Config, ForgeConfig, LoggingConfig, RegistryConfig};
pub use registry::{
    worktree_key, PrStatus, Registry, WorktreeEntry, WorktreeKey, FIRST_ID, REGISTRY_VERSION,
};
pub use worktree::{repo_name_of, LiveWorktree, RepoInfo, ResolveContext, Target};
