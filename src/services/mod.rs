pub mod pr_refresh;
pub mod target_resolver;
pub mod worktree_sync;

pub use pr_refresh::{PrRefresher, RefreshConfig, RefreshSummary};
pub use target_resolver::{parse_id, BranchQuery, TargetResolver};
pub use worktree_sync::{sync_worktrees, sync_worktrees_with_report, IdLookup, SyncReport};
