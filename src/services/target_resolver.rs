//! Target resolution.
//!
//! Turns what the user typed (a small integer, a branch name, a
//! `scope:branch` pair, explicit `-n` / `-r` / `-l` flags, or nothing at all
//! plus the current directory) into exactly one worktree or repository.
//! Ambiguity is always reported with the full candidate list; the resolver
//! never silently picks one.

use std::path::Path;

use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{LiveWorktree, RepoInfo, ResolveContext, Target};
use crate::services::worktree_sync::IdLookup;

/// Separator between scope and branch in `scope:branch`.
pub const SCOPE_SEPARATOR: char = ':';

/// Resolves user input against one synced snapshot of worktrees and repositories.
#[derive(Debug, Clone, Copy)]
pub struct TargetResolver<'a> {
    worktrees: &'a [LiveWorktree],
    ids: &'a IdLookup,
    repos: &'a [RepoInfo],
}

/// A branch query, optionally narrowed to a repository or label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchQuery<'s> {
    pub scope: Option<&'s str>,
    pub branch: &'s str,
}

impl<'s> BranchQuery<'s> {
    /// Split `scope:branch`; plain input is an unscoped branch.
    pub fn parse(input: &'s str) -> DomainResult<Self> {
        let Some((scope, branch)) = input.split_once(SCOPE_SEPARATOR) else {
            let branch = input.trim();
            if branch.is_empty() {
                return Err(invalid(input, "branch name is empty"));
            }
            return Ok(Self {
                scope: None,
                branch,
            });
        };

        let scope = scope.trim();
        let branch = branch.trim();
        if scope.is_empty() {
            return Err(invalid(input, "nothing before ':' (expected repo:branch or label:branch)"));
        }
        if branch.is_empty() {
            return Err(invalid(input, "nothing after ':' (expected a branch name)"));
        }
        Ok(Self {
            scope: Some(scope),
            branch,
        })
    }
}

fn invalid(token: &str, reason: &str) -> DomainError {
    DomainError::InvalidTarget {
        token: token.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse input as a worktree ID (positive integer).
pub fn parse_id(input: &str) -> Option<u64> {
    input.trim().parse::<u64>().ok().filter(|id| *id > 0)
}

impl<'a> TargetResolver<'a> {
    pub const fn new(worktrees: &'a [LiveWorktree], ids: &'a IdLookup, repos: &'a [RepoInfo]) -> Self {
        Self {
            worktrees,
            ids,
            repos,
        }
    }

    /// Find the live worktree holding `id`.
    pub fn resolve_by_id(&self, id: u64) -> DomainResult<Target> {
        self.indexed()
            .find(|(_, wt_id)| *wt_id == id)
            .map(|(wt, wt_id)| Target::from_worktree(wt, wt_id))
            .ok_or_else(|| DomainError::TargetNotFound(format!("no worktree with ID {id}")))
    }

    /// Resolve an ID, a branch name, or `scope:branch` to one worktree.
    ///
    /// An unscoped branch checked out in several repositories is ambiguous.
    /// With a label scope covering several repositories the first match (by
    /// repository name) wins.
    pub fn resolve_by_id_or_branch(&self, input: &str) -> DomainResult<Target> {
        if let Some(id) = parse_id(input) {
            return self.resolve_by_id(id);
        }

        let query = BranchQuery::parse(input)?;
        let mut matches = self.branch_matches(&query)?;
        if matches.is_empty() {
            return Err(not_found_for(&query));
        }
        if query.scope.is_none() && matches.len() > 1 {
            return Err(ambiguous(input, &matches));
        }
        Ok(matches.swap_remove(0))
    }

    /// Like [`Self::resolve_by_id_or_branch`] but returns every match in scope.
    ///
    /// For commands that act on several repositories at once. Unscoped
    /// branches matching more than one repository are still ambiguous.
    pub fn resolve_all_by_id_or_branch(&self, input: &str) -> DomainResult<Vec<Target>> {
        if let Some(id) = parse_id(input) {
            return self.resolve_by_id(id).map(|t| vec![t]);
        }

        let query = BranchQuery::parse(input)?;
        let matches = self.branch_matches(&query)?;
        if matches.is_empty() {
            return Err(not_found_for(&query));
        }
        if query.scope.is_none() && matches.len() > 1 {
            return Err(ambiguous(input, &matches));
        }
        Ok(matches)
    }

    /// Resolve from explicit flags, falling back to the working directory.
    ///
    /// Precedence: ID, repository, label, enclosing worktree. Standing in a
    /// main repository without flags is ambiguous; standing anywhere else is
    /// an error asking for a target.
    pub fn resolve_by_id_or_repo_or_context(&self, ctx: &ResolveContext) -> DomainResult<Target> {
        if let Some(id) = ctx.explicit_id {
            debug!(id, "resolving by explicit ID");
            return self.resolve_by_id(id);
        }

        if let Some(name) = ctx.explicit_repo.as_deref() {
            debug!(repo = name, "resolving by explicit repository");
            return self
                .repo_by_name(name)
                .map(|repo| Target::from_repo(&repo))
                .ok_or_else(|| DomainError::TargetNotFound(format!("no repository named '{name}'")));
        }

        if let Some(label) = ctx.explicit_label.as_deref() {
            debug!(label, "resolving by explicit label");
            let labelled: Vec<&RepoInfo> = self.repos.iter().filter(|r| r.has_label(label)).collect();
            return match labelled.as_slice() {
                [] => Err(DomainError::TargetNotFound(format!(
                    "no repository labelled '{label}'"
                ))),
                [repo] => Ok(Target::from_repo(repo)),
                many => Err(DomainError::AmbiguousTarget {
                    input: format!("label {label}"),
                    candidates: many.iter().map(|r| format!("-r {}", r.name)).collect(),
                }),
            };
        }

        if let Some((wt, id)) = self.enclosing_worktree(&ctx.working_dir) {
            debug!(id, path = %wt.path.display(), "resolved from working directory");
            return Ok(Target::from_worktree(wt, id));
        }

        if let Some(repo) = self.enclosing_repo(&ctx.working_dir) {
            let mut candidates = vec![format!("-r {} (the repository itself)", repo.name)];
            candidates.extend(
                self.indexed()
                    .filter(|(wt, _)| wt.repo_path == repo.path)
                    .map(|(wt, id)| format!("-n {id} ({})", display_branch(&wt.branch))),
            );
            return Err(DomainError::AmbiguousTarget {
                input: ctx.working_dir.display().to_string(),
                candidates,
            });
        }

        Err(DomainError::TargetRequired(
            "not inside a worktree; pass a worktree ID with -n or a repository with -r".to_string(),
        ))
    }

    /// Live worktrees paired with their registry IDs.
    fn indexed(&self) -> impl Iterator<Item = (&'a LiveWorktree, u64)> + 'a {
        let ids = self.ids;
        self.worktrees
            .iter()
            .filter_map(move |wt| ids.get(&wt.path).map(|id| (wt, *id)))
    }

    /// Configured repositories plus any main repository that only shows up
    /// as the owner of a live worktree.
    fn known_repos(&self) -> Vec<RepoInfo> {
        let mut repos = self.repos.to_vec();
        for wt in self.worktrees {
            if !repos.iter().any(|r| r.path == wt.repo_path) {
                repos.push(RepoInfo::new(&wt.repo_path, ""));
            }
        }
        repos
    }

    fn repo_by_name(&self, name: &str) -> Option<RepoInfo> {
        self.known_repos().into_iter().find(|r| r.name == name)
    }

    /// Repositories a scope token refers to. Repository names beat labels.
    fn scope_repos(&self, scope: &str) -> DomainResult<Vec<RepoInfo>> {
        let known = self.known_repos();
        let mut by_name: Vec<RepoInfo> = known.iter().filter(|r| r.name == scope).cloned().collect();
        if by_name.is_empty() {
            by_name = known.into_iter().filter(|r| r.has_label(scope)).collect();
        }
        if by_name.is_empty() {
            return Err(DomainError::TargetNotFound(format!(
                "no repository or label named '{scope}'"
            )));
        }
        by_name.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(by_name)
    }

    fn branch_matches(&self, query: &BranchQuery<'_>) -> DomainResult<Vec<Target>> {
        let on_branch = self.indexed().filter(|(wt, _)| wt.branch == query.branch);

        let Some(scope) = query.scope else {
            let mut all: Vec<Target> = on_branch
                .map(|(wt, id)| Target::from_worktree(wt, id))
                .collect();
            all.sort_by_key(|t| t.id);
            return Ok(all);
        };

        let repos = self.scope_repos(scope)?;
        let candidates: Vec<(&LiveWorktree, u64)> = on_branch.collect();
        let mut matches = Vec::new();
        for repo in repos {
            matches.extend(
                candidates
                    .iter()
                    .filter(|(wt, _)| wt.repo_path == repo.path)
                    .map(|(wt, id)| Target::from_worktree(wt, *id)),
            );
        }
        Ok(matches)
    }

    /// Deepest live worktree containing `dir`.
    fn enclosing_worktree(&self, dir: &Path) -> Option<(&'a LiveWorktree, u64)> {
        self.indexed()
            .filter(|(wt, _)| dir.starts_with(&wt.path))
            .max_by_key(|(wt, _)| wt.path.components().count())
    }

    /// Known main repository containing `dir`.
    ///
    /// Repositories only referenced as a worktree's main repo count too, so
    /// this works without any configured repository directories.
    fn enclosing_repo(&self, dir: &Path) -> Option<RepoInfo> {
        if let Some(repo) = self
            .repos
            .iter()
            .filter(|r| dir.starts_with(&r.path))
            .max_by_key(|r| r.path.components().count())
        {
            return Some(repo.clone());
        }
        self.worktrees
            .iter()
            .filter(|wt| dir.starts_with(&wt.repo_path))
            .max_by_key(|wt| wt.repo_path.components().count())
            .map(|wt| RepoInfo::new(&wt.repo_path, ""))
    }
}

fn display_branch(branch: &str) -> &str {
    if branch.is_empty() {
        "detached"
    } else {
        branch
    }
}

fn not_found_for(query: &BranchQuery<'_>) -> DomainError {
    match query.scope {
        Some(scope) => DomainError::TargetNotFound(format!(
            "no worktree on branch '{}' in '{scope}'",
            query.branch
        )),
        None => DomainError::TargetNotFound(format!("no worktree on branch '{}'", query.branch)),
    }
}

fn ambiguous(input: &str, matches: &[Target]) -> DomainError {
    DomainError::AmbiguousTarget {
        input: input.to_string(),
        candidates: matches.iter().map(ToString::to_string).collect(),
    }
}
