use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure for arbor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Root directory scanned for worktrees; holds the registry and its lock
    #[serde(default = "default_worktree_dir")]
    pub worktree_dir: PathBuf,

    /// Directories whose immediate children are main repositories
    #[serde(default)]
    pub repo_dirs: Vec<PathBuf>,

    /// Registry persistence configuration
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Forge (pull request host) configuration
    #[serde(default)]
    pub forge: ForgeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_worktree_dir() -> PathBuf {
    PathBuf::from("~/worktrees")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worktree_dir: default_worktree_dir(),
            repo_dirs: vec![],
            registry: RegistryConfig::default(),
            forge: ForgeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Return a copy with `~` expanded in every configured path.
    #[must_use]
    pub fn expanded(mut self) -> Self {
        self.worktree_dir = expand_tilde(&self.worktree_dir);
        self.repo_dirs = self.repo_dirs.iter().map(|p| expand_tilde(p)).collect();
        self.logging.log_dir = self.logging.log_dir.as_deref().map(expand_tilde);
        self
    }
}

/// Expand a leading `~` against the user's home directory.
pub fn expand_tilde(path: &std::path::Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Registry persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistryConfig {
    /// How long to wait for another process's registry lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

const fn default_lock_timeout_ms() -> u64 {
    10_000
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Forge configuration for the PR status refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ForgeConfig {
    /// Maximum concurrent forge lookups (1-64)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-lookup timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Cached statuses younger than this are not refetched
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// GitHub CLI binary
    #[serde(default = "default_gh_bin")]
    pub gh_bin: String,
}

const fn default_concurrency() -> usize {
    5
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_gh_bin() -> String {
    "gh".to_string()
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            gh_bin: default_gh_bin(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for rolling log files
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// File rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
