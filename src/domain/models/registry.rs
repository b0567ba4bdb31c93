//! Worktree registry domain model.
//!
//! The registry maps a stable [`WorktreeKey`] (derived from the worktree's
//! directory name) to a [`WorktreeEntry`] carrying the small numeric ID users
//! type, plus the last-known metadata needed to re-associate moved worktrees.
//!
//! Every record carries an `extra` map that captures fields this version does
//! not understand, so forge-specific metadata written by other tools (or a
//! newer arbor) survives a load/save round-trip untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current on-disk schema version.
pub const REGISTRY_VERSION: u32 = 1;

/// First ID handed out by an empty (or freshly reset) registry.
pub const FIRST_ID: u64 = 1;

/// Registry key for a worktree: its directory name.
pub type WorktreeKey = String;

/// Derive the registry key for a worktree path.
///
/// Uses the final path component so the key survives the worktree being
/// moved to another parent directory. Falls back to the full path when the
/// path has no final component (e.g. `/`).
pub fn worktree_key(path: &Path) -> WorktreeKey {
    path.file_name().map_or_else(
        || path.to_string_lossy().into_owned(),
        |name| name.to_string_lossy().into_owned(),
    )
}

/// Cached pull-request status for a worktree's branch.
///
/// The core never interprets these values; they are snapshots written by the
/// PR refresh phase and read back by display code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrStatus {
    /// PR number on the forge, `None` when the branch has no PR.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,

    /// Forge-reported state (e.g. `OPEN`, `MERGED`, `CLOSED`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Whether a lookup has completed at least once.
    #[serde(default)]
    pub fetched: bool,

    /// When the snapshot was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,

    /// Forge-specific fields (url, draft flag, ...), preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PrStatus {
    /// Check whether the snapshot is older than `ttl_secs` (or was never taken).
    pub fn is_stale(&self, now: DateTime<Utc>, ttl_secs: u64) -> bool {
        if !self.fetched {
            return true;
        }
        let Some(fetched_at) = self.fetched_at else {
            return true;
        };
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        now.signed_duration_since(fetched_at).num_seconds() >= ttl
    }

    /// Forge URL of the PR, when the forge supplied one.
    pub fn url(&self) -> Option<&str> {
        self.extra.get("url").and_then(Value::as_str)
    }

    /// Short human label such as `#12 OPEN` or `-`.
    pub fn label(&self) -> String {
        match (self.number, self.state.as_deref()) {
            (Some(n), Some(state)) => format!("#{n} {state}"),
            (Some(n), None) => format!("#{n}"),
            (None, _) if self.fetched => "none".to_string(),
            (None, _) => "-".to_string(),
        }
    }
}

/// One record per known worktree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorktreeEntry {
    /// Stable numeric ID, unique within the registry.
    pub id: u64,

    /// Main repository the worktree was created from.
    #[serde(default)]
    pub repo_path: PathBuf,

    /// Last-seen checked-out branch.
    #[serde(default)]
    pub branch: String,

    /// Last-seen `origin` remote URL.
    #[serde(default)]
    pub origin_url: String,

    /// Cached forge status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_status: Option<PrStatus>,

    /// Free-text user annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Set when the worktree was deleted through arbor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_at: Option<DateTime<Utc>>,

    /// Unknown fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorktreeEntry {
    /// Create a fresh entry for a newly seen worktree.
    pub fn new(
        id: u64,
        repo_path: impl Into<PathBuf>,
        branch: impl Into<String>,
        origin_url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            repo_path: repo_path.into(),
            branch: branch.into(),
            origin_url: origin_url.into(),
            pr_status: None,
            note: None,
            removed_at: None,
            extra: Map::new(),
        }
    }

    pub fn is_removed(&self) -> bool {
        self.removed_at.is_some()
    }
}

/// The full persisted registry for one worktree root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    /// Schema version of the file this registry was read from.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Entries keyed by [`WorktreeKey`].
    #[serde(default)]
    pub entries: BTreeMap<WorktreeKey, WorktreeEntry>,

    /// Next ID to hand out. Always greater than every ID ever assigned.
    #[serde(default = "default_next_id")]
    pub next_id: u64,

    /// Unknown top-level fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const fn default_version() -> u32 {
    REGISTRY_VERSION
}

const fn default_next_id() -> u64 {
    FIRST_ID
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            entries: BTreeMap::new(),
            next_id: FIRST_ID,
            extra: Map::new(),
        }
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next ID and advance the counter.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Clear every entry and restart numbering at 1.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.next_id = FIRST_ID;
    }

    /// Restore the `next_id` invariant after loading a hand-edited file.
    ///
    /// Returns `true` when the counter had to be raised.
    pub fn repair_next_id(&mut self) -> bool {
        let floor = self
            .entries
            .values()
            .map(|e| e.id)
            .max()
            .map_or(FIRST_ID, |max| max + 1);
        if self.next_id < floor {
            self.next_id = floor;
            true
        } else {
            false
        }
    }

    /// Mark an entry as removed. Returns `false` for unknown or already removed keys.
    pub fn mark_removed(&mut self, key: &str) -> bool {
        self.mark_removed_at(key, Utc::now())
    }

    pub(crate) fn mark_removed_at(&mut self, key: &str, when: DateTime<Utc>) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) if entry.removed_at.is_none() => {
                entry.removed_at = Some(when);
                true
            }
            _ => false,
        }
    }

    /// Find the live entry holding `id`.
    pub fn entry_by_id(&self, id: u64) -> Option<(&WorktreeKey, &WorktreeEntry)> {
        self.entries
            .iter()
            .find(|(_, e)| e.id == id && !e.is_removed())
    }

    /// Mutable variant of [`Registry::entry_by_id`].
    pub fn entry_by_id_mut(&mut self, id: u64) -> Option<&mut WorktreeEntry> {
        self.entries
            .values_mut()
            .find(|e| e.id == id && !e.is_removed())
    }

    /// Iterate over entries that have not been marked removed.
    pub fn live_entries(&self) -> impl Iterator<Item = (&WorktreeKey, &WorktreeEntry)> {
        self.entries.iter().filter(|(_, e)| !e.is_removed())
    }

    /// Set or clear the note on the live entry holding `id`.
    ///
    /// Blank notes clear the annotation. Returns `false` if no live entry has `id`.
    pub fn set_note(&mut self, id: u64, note: Option<&str>) -> bool {
        let Some(entry) = self.entry_by_id_mut(id) else {
            return false;
        };
        entry.note = note
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        true
    }

    /// Drop removed entries whose `removed_at` is older than `cutoff`.
    ///
    /// Returns the number of purged entries. `next_id` is untouched, so purged
    /// IDs are never handed out again.
    pub fn purge_removed(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| e.removed_at.map_or(true, |at| at >= cutoff));
        before - self.entries.len()
    }
}
