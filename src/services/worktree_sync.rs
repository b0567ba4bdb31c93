//! Worktree Synchronizer
//!
//! Reconciles the live worktree list reported by the VCS collaborator with
//! the registry. Runs on every command, not just on creation, because
//! worktrees can be created, moved or deleted with plain `git` behind arbor's
//! back; the registry heals itself instead of assuming it is the only writer.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use crate::domain::models::{worktree_key, LiveWorktree, Registry, WorktreeEntry, WorktreeKey};

/// Path → registry ID for every live worktree.
pub type IdLookup = HashMap<PathBuf, u64>;

/// What a sync pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// New entries (new IDs handed out)
    pub created: usize,
    /// Live entries whose metadata changed
    pub updated: usize,
    /// Entries moved to a new key because their directory was renamed
    pub reassociated: usize,
    /// Removed entries set aside because their key reappeared
    pub retired: usize,
    /// Live registry entries with no worktree on disk
    pub vanished: usize,
}

impl SyncReport {
    pub const fn changed(&self) -> bool {
        self.created + self.updated + self.reassociated + self.retired > 0
    }
}

/// Reconcile `registry` with `live` and return the path → ID lookup.
pub fn sync_worktrees(registry: &mut Registry, live: &[LiveWorktree]) -> IdLookup {
    sync_worktrees_with_report(registry, live).0
}

/// [`sync_worktrees`], also reporting what changed.
///
/// Running twice with the same live set assigns the same IDs and leaves every
/// entry untouched on the second pass.
#[instrument(skip_all, fields(live = live.len()))]
pub fn sync_worktrees_with_report(
    registry: &mut Registry,
    live: &[LiveWorktree],
) -> (IdLookup, SyncReport) {
    let keyed = live_keys(live);
    let live_key_set: HashSet<&str> = keyed.iter().map(|(k, _)| k.as_str()).collect();

    let mut report = SyncReport::default();
    let mut lookup = IdLookup::with_capacity(live.len());

    for (key, wt) in &keyed {
        let id = if let Some(entry) = registry
            .entries
            .get_mut(key)
            .filter(|e| !e.is_removed())
        {
            if refresh_metadata(entry, wt) {
                debug!(key = %key, worktree_id = entry.id, branch = %wt.branch, "updated worktree metadata");
                report.updated += 1;
            }
            entry.id
        } else {
            if registry.entries.contains_key(key) {
                retire(registry, key);
                report.retired += 1;
            }
            if let Some(id) = reassociate(registry, key, wt, &live_key_set) {
                report.reassociated += 1;
                id
            } else {
                let id = registry.allocate_id();
                registry.entries.insert(
                    key.clone(),
                    WorktreeEntry::new(id, &wt.repo_path, &wt.branch, &wt.origin_url),
                );
                info!(key = %key, worktree_id = id, branch = %wt.branch, "registered new worktree");
                report.created += 1;
                id
            }
        };
        lookup.insert(wt.path.clone(), id);
    }

    report.vanished = registry
        .live_entries()
        .filter(|(k, _)| !live_key_set.contains(k.as_str()))
        .count();

    debug!(?report, next_id = registry.next_id, "sync complete");
    (lookup, report)
}

/// Compute a collision-free key for every live worktree.
///
/// The first worktree with a given directory name keeps the bare name; any
/// later one in the same list is keyed by its full path.
fn live_keys(live: &[LiveWorktree]) -> Vec<(WorktreeKey, &LiveWorktree)> {
    let mut seen = HashSet::new();
    live.iter()
        .map(|wt| {
            let mut key = worktree_key(&wt.path);
            if !seen.insert(key.clone()) {
                warn!(
                    path = %wt.path.display(),
                    key = %key,
                    "duplicate worktree directory name, keying by full path"
                );
                key = wt.path.to_string_lossy().into_owned();
                seen.insert(key.clone());
            }
            (key, wt)
        })
        .collect()
}

fn refresh_metadata(entry: &mut WorktreeEntry, wt: &LiveWorktree) -> bool {
    let mut changed = false;
    if entry.repo_path != wt.repo_path {
        entry.repo_path.clone_from(&wt.repo_path);
        changed = true;
    }
    if entry.branch != wt.branch {
        entry.branch.clone_from(&wt.branch);
        changed = true;
    }
    if entry.origin_url != wt.origin_url {
        entry.origin_url.clone_from(&wt.origin_url);
        changed = true;
    }
    changed
}

/// Move a removed entry out of the way so its key can be reused with a new ID.
fn retire(registry: &mut Registry, key: &str) {
    let Some(entry) = registry.entries.remove(key) else {
        return;
    };
    let mut tombstone = format!("{key}#{}", entry.id);
    while registry.entries.contains_key(&tombstone) {
        tombstone.push('#');
    }
    debug!(key = %key, worktree_id = entry.id, tombstone = %tombstone, "retired removed entry");
    registry.entries.insert(tombstone, entry);
}

/// Re-key an orphaned entry that matches a worktree whose directory was renamed.
///
/// Only happens when exactly one live, unmatched entry has the same main
/// repository and branch, so the match cannot be ambiguous.
fn reassociate(
    registry: &mut Registry,
    key: &str,
    wt: &LiveWorktree,
    live_key_set: &HashSet<&str>,
) -> Option<u64> {
    if wt.branch.is_empty() {
        return None;
    }

    let candidates: Vec<WorktreeKey> = registry
        .live_entries()
        .filter(|(k, e)| {
            !live_key_set.contains(k.as_str()) && e.repo_path == wt.repo_path && e.branch == wt.branch
        })
        .map(|(k, _)| k.clone())
        .collect();
    let [old_key] = candidates.as_slice() else {
        return None;
    };
    let old_key = old_key.clone();

    let mut entry = registry.entries.remove(&old_key)?;
    refresh_metadata(&mut entry, wt);
    let id = entry.id;
    info!(from = %old_key, to = %key, worktree_id = id, "re-associated moved worktree");
    registry.entries.insert(key.to_string(), entry);
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn wt(path: &str, repo: &str, branch: &str) -> LiveWorktree {
        LiveWorktree::new(path, repo, branch, format!("git@github.com:o/{branch}.git"))
    }

    #[test]
    fn test_assigns_sequential_ids() {
        let mut reg = Registry::new();
        let live = vec![wt("/wt/a", "/code/api", "a"), wt("/wt/b", "/code/api", "b")];

        let (ids, report) = sync_worktrees_with_report(&mut reg, &live);
        assert_eq!(ids[&PathBuf::from("/wt/a")], 1);
        assert_eq!(ids[&PathBuf::from("/wt/b")], 2);
        assert_eq!(reg.next_id, 3);
        assert_eq!(report.created, 2);
    }

    #[test]
    fn test_second_sync_changes_nothing() {
        let mut reg = Registry::new();
        let live = vec![wt("/wt/a", "/code/api", "a"), wt("/wt/b", "/code/web", "b")];

        let first = sync_worktrees(&mut reg, &live);
        let snapshot = reg.clone();
        let (second, report) = sync_worktrees_with_report(&mut reg, &live);

        assert_eq!(first, second);
        assert_eq!(reg, snapshot);
        assert!(!report.changed());
    }

    #[test]
    fn test_branch_rename_updates_metadata_keeps_id() {
        let mut reg = Registry::new();
        sync_worktrees(&mut reg, &[wt("/wt/a", "/code/api", "old")]);

        let (ids, report) = sync_worktrees_with_report(&mut reg, &[wt("/wt/a", "/code/api", "new")]);
        assert_eq!(ids[&PathBuf::from("/wt/a")], 1);
        assert_eq!(reg.entries["a"].branch, "new");
        assert_eq!(report.updated, 1);
    }

    #[test]
    fn test_vanished_entries_are_kept() {
        let mut reg = Registry::new();
        sync_worktrees(&mut reg, &[wt("/wt/a", "/code/api", "a"), wt("/wt/b", "/code/api", "b")]);
        reg.set_note(2, Some("keep me"));

        let (ids, report) = sync_worktrees_with_report(&mut reg, &[wt("/wt/a", "/code/api", "a")]);
        assert_eq!(ids.len(), 1);
        assert_eq!(report.vanished, 1);
        assert_eq!(reg.entries["b"].note.as_deref(), Some("keep me"));
        assert!(reg.entries["b"].removed_at.is_none());
    }

    #[test]
    fn test_moved_worktree_keeps_identity() {
        let mut reg = Registry::new();
        sync_worktrees(&mut reg, &[wt("/wt/a", "/code/api", "feat")]);
        reg.set_note(1, Some("moved"));

        let (ids, report) =
            sync_worktrees_with_report(&mut reg, &[wt("/elsewhere/renamed", "/code/api", "feat")]);
        assert_eq!(ids[&PathBuf::from("/elsewhere/renamed")], 1);
        assert_eq!(report.reassociated, 1);
        assert!(!reg.entries.contains_key("a"));
        assert_eq!(reg.entries["renamed"].note.as_deref(), Some("moved"));
        assert_eq!(reg.next_id, 2);
    }

    #[test]
    fn test_reassociation_picks_single_orphan_among_others() {
        let mut reg = Registry::new();
        sync_worktrees(
            &mut reg,
            &[wt("/wt/a", "/code/api", "feat"), wt("/wt/b", "/code/api", "fix")],
        );

        let ids = sync_worktrees(&mut reg, &[wt("/wt/renamed", "/code/api", "feat")]);
        assert_eq!(ids[&PathBuf::from("/wt/renamed")], 1);
        assert!(!reg.entries.contains_key("a"));
        assert_eq!(reg.entries["b"].id, 2);
        assert_eq!(reg.next_id, 3);
    }

    #[test]
    fn test_moved_to_other_parent_same_name_is_direct_hit() {
        let mut reg = Registry::new();
        sync_worktrees(&mut reg, &[wt("/wt/a", "/code/api", "feat")]);
        let ids = sync_worktrees(&mut reg, &[wt("/other/a", "/code/api", "feat")]);
        assert_eq!(ids[&PathBuf::from("/other/a")], 1);
    }

    #[test]
    fn test_ambiguous_reassociation_allocates_fresh_id() {
        let mut reg = Registry::new();
        // Two orphans with the same repo + branch can only come from a hand-edited
        // or merged registry; neither should be picked.
        reg.entries
            .insert("x".to_string(), WorktreeEntry::new(1, "/code/api", "feat", ""));
        reg.entries
            .insert("y".to_string(), WorktreeEntry::new(2, "/code/api", "feat", ""));
        reg.next_id = 3;

        let ids = sync_worktrees(&mut reg, &[wt("/wt/z", "/code/api", "feat")]);
        assert_eq!(ids[&PathBuf::from("/wt/z")], 3);
        assert!(reg.entries.contains_key("x"));
        assert!(reg.entries.contains_key("y"));
    }

    #[test]
    fn test_removed_entry_is_never_revived() {
        let mut reg = Registry::new();
        sync_worktrees(&mut reg, &[wt("/wt/a", "/code/api", "a")]);
        reg.set_note(1, Some("old note"));
        assert!(reg.mark_removed("a"));

        let (ids, report) = sync_worktrees_with_report(&mut reg, &[wt("/wt/a", "/code/api", "a")]);
        assert_eq!(ids[&PathBuf::from("/wt/a")], 2);
        assert_eq!(report.retired, 1);
        assert_eq!(reg.entries["a"].note, None);
        assert!(reg.entries["a"].removed_at.is_none());

        let tomb = &reg.entries["a#1"];
        assert_eq!(tomb.id, 1);
        assert!(tomb.removed_at.is_some());
        assert_eq!(tomb.note.as_deref(), Some("old note"));
    }

    #[test]
    fn test_removed_entry_is_not_reassociation_candidate() {
        let mut reg = Registry::new();
        sync_worktrees(&mut reg, &[wt("/wt/a", "/code/api", "feat")]);
        reg.mark_removed("a");

        let ids = sync_worktrees(&mut reg, &[wt("/wt/b", "/code/api", "feat")]);
        assert_eq!(ids[&PathBuf::from("/wt/b")], 2);
    }

    #[test]
    fn test_duplicate_directory_names_get_distinct_ids() {
        let mut reg = Registry::new();
        let live = vec![wt("/wt1/a", "/code/api", "x"), wt("/wt2/a", "/code/web", "y")];
        let ids = sync_worktrees(&mut reg, &live);
        assert_ne!(ids[&PathBuf::from("/wt1/a")], ids[&PathBuf::from("/wt2/a")]);
        assert!(reg.entries.contains_key("/wt2/a"));

        let again = sync_worktrees(&mut reg, &live);
        assert_eq!(ids, again);
    }

    #[test]
    fn test_reset_renumbers_from_one() {
        let mut reg = Registry::new();
        let live: Vec<_> = (0..7)
            .map(|i| wt(&format!("/wt/{i}"), "/code/api", &format!("b{i}")))
            .collect();
        let ids = sync_worktrees(&mut reg, &live);
        assert_eq!(ids[&PathBuf::from("/wt/6")], 7);
        reg.entry_by_id_mut(7).unwrap().pr_status = Some(crate::domain::models::PrStatus {
            fetched: true,
            fetched_at: Some(Utc::now()),
            ..Default::default()
        });
        reg.mark_removed("0");

        reg.reset();
        let ids = sync_worktrees(&mut reg, &[wt("/wt/6", "/code/api", "b6")]);
        assert_eq!(ids[&PathBuf::from("/wt/6")], 1);
        assert!(reg.entries.values().all(|e| e.removed_at.is_none() && e.pr_status.is_none()));
    }
}
