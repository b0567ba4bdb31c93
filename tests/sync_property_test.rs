//! Property tests for ID assignment.

mod common;

use std::collections::HashSet;

use arbor::domain::models::Registry;
use arbor::services::{sync_worktrees, sync_worktrees_with_report};
use common::wt;
use proptest::prelude::*;

/// Up to 20 distinct worktree directory names with arbitrary branches.
fn live_sets() -> impl Strategy<Value = Vec<arbor::LiveWorktree>> {
    prop::collection::btree_map("[a-z]{1,8}", "[a-z/]{0,8}", 0..20).prop_map(|dirs| {
        dirs.into_iter()
            .map(|(dir, branch)| wt(&dir, "repo", &branch))
            .collect()
    })
}

proptest! {
    /// Property: syncing an unchanged live set twice yields the same IDs and
    /// leaves the registry untouched.
    #[test]
    fn prop_sync_is_idempotent(live in live_sets()) {
        let mut registry = Registry::new();
        let first = sync_worktrees(&mut registry, &live);
        let snapshot = registry.clone();

        let (second, report) = sync_worktrees_with_report(&mut registry, &live);
        prop_assert_eq!(first, second);
        prop_assert!(!report.changed());
        prop_assert_eq!(registry, snapshot);
    }

    /// Property: after N distinct worktrees, next_id is above N and no two
    /// live worktrees share an ID.
    #[test]
    fn prop_ids_are_unique_and_monotonic(live in live_sets()) {
        let mut registry = Registry::new();
        let ids = sync_worktrees(&mut registry, &live);

        prop_assert!(registry.next_id > live.len() as u64);
        let distinct: HashSet<u64> = ids.values().copied().collect();
        prop_assert_eq!(distinct.len(), live.len());
        prop_assert!(ids.values().all(|id| *id < registry.next_id));
    }

    /// Property: dropping some worktrees and adding new ones never changes
    /// the IDs of the survivors, and new IDs are fresh.
    #[test]
    fn prop_survivors_keep_ids(live in live_sets(), keep_mask in prop::collection::vec(any::<bool>(), 20)) {
        let mut registry = Registry::new();
        let before = sync_worktrees(&mut registry, &live);
        let high_water = registry.next_id;

        let mut next: Vec<_> = live
            .iter()
            .zip(keep_mask.iter())
            .filter(|(_, keep)| **keep)
            .map(|(w, _)| w.clone())
            .collect();
        // The dash keeps this branch out of the generated alphabet, so it cannot
        // inherit an orphaned ID by reassociation.
        next.push(wt("zz-new-worktree", "repo", "fresh-branch"));

        let after = sync_worktrees(&mut registry, &next);
        for w in &next[..next.len() - 1] {
            prop_assert_eq!(before[&w.path], after[&w.path]);
        }
        let new_path = &next[next.len() - 1].path;
        prop_assert!(after[new_path] >= high_water);
    }
}
