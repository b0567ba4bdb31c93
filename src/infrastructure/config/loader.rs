use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project-local override file looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = ".arbor.yaml";

/// Prefix for environment overrides (`ARBOR_FORGE__CONCURRENCY=8`)
pub const ENV_PREFIX: &str = "ARBOR_";

const MAX_CONCURRENCY: usize = 64;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("worktree_dir cannot be empty")]
    EmptyWorktreeDir,

    #[error("Invalid forge.concurrency: {0}. Must be between 1 and {MAX_CONCURRENCY}")]
    InvalidConcurrency(usize),

    #[error("Invalid forge.timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Invalid registry.lock_timeout_ms: {0}. Must be at least 1")]
    InvalidLockTimeout(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// User-level config file, `<config dir>/arbor/config.yaml`.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("arbor").join("config.yaml"))
    }

    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. User config (`~/.config/arbor/config.yaml` on Linux)
    /// 3. `.arbor.yaml` in the working directory
    /// 4. The explicit `--config` file, if given
    /// 5. Environment variables (`ARBOR_*`, `__` for nesting)
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(user) = Self::user_config_path() {
            figment = figment.merge(Yaml::file(user));
        }
        figment = figment.merge(Yaml::file(PROJECT_CONFIG_FILE));
        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config.expanded())
    }

    /// Load configuration from a specific file (defaults plus that file only)
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config.expanded())
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.worktree_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyWorktreeDir);
        }

        if config.forge.concurrency == 0 || config.forge.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::InvalidConcurrency(config.forge.concurrency));
        }

        if config.forge.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.forge.timeout_secs));
        }

        if config.registry.lock_timeout_ms == 0 {
            return Err(ConfigError::InvalidLockTimeout(config.registry.lock_timeout_ms));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.worktree_dir, PathBuf::from("~/worktrees"));
        assert_eq!(config.forge.concurrency, 5);
        assert_eq!(config.forge.timeout_secs, 30);
        assert_eq!(config.registry.lock_timeout_ms, 10_000);
        assert_eq!(config.logging.level, "warn");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
worktree_dir: /srv/worktrees
repo_dirs:
  - /srv/code
forge:
  concurrency: 12
  gh_bin: /opt/gh
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.worktree_dir, PathBuf::from("/srv/worktrees"));
        assert_eq!(config.repo_dirs, vec![PathBuf::from("/srv/code")]);
        assert_eq!(config.forge.concurrency, 12);
        assert_eq!(config.forge.timeout_secs, 30, "unset fields keep defaults");
        assert_eq!(config.forge.gh_bin, "/opt/gh");
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_concurrency_bounds() {
        for bad in [0, 65] {
            let mut config = Config::default();
            config.forge.concurrency = bad;
            assert!(matches!(
                ConfigLoader::validate(&config),
                Err(ConfigError::InvalidConcurrency(n)) if n == bad
            ));
        }

        let mut config = Config::default();
        config.forge.concurrency = 64;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_worktree_dir() {
        let config = Config {
            worktree_dir: PathBuf::new(),
            ..Default::default()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyWorktreeDir)
        ));
    }

    #[test]
    fn test_validate_zero_timeouts() {
        let mut config = Config::default();
        config.forge.timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTimeout(0))
        ));

        let mut config = Config::default();
        config.registry.lock_timeout_ms = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLockTimeout(0))
        ));
    }

    #[test]
    fn test_validate_invalid_logging() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidLogLevel(level)) => assert_eq!(level, "loud"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "worktree_dir: /tmp/wt\nforge:\n  concurrency: 3").unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.worktree_dir, PathBuf::from("/tmp/wt"));
        assert_eq!(config.forge.concurrency, 3);
        assert_eq!(config.forge.cache_ttl_secs, 300);
    }

    #[test]
    fn test_env_override() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "worktree_dir: /tmp/wt\nforge:\n  concurrency: 3").unwrap();
        file.flush().unwrap();

        temp_env::with_vars(
            [
                ("ARBOR_FORGE__CONCURRENCY", Some("9")),
                ("ARBOR_LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let config = ConfigLoader::load(Some(file.path())).unwrap();
                assert_eq!(config.forge.concurrency, 9, "env beats the explicit file");
                assert_eq!(config.logging.level, "debug");
                assert_eq!(config.worktree_dir, PathBuf::from("/tmp/wt"));
            },
        );
    }

    #[test]
    fn test_env_override_is_validated() {
        temp_env::with_var("ARBOR_FORGE__CONCURRENCY", Some("0"), || {
            assert!(ConfigLoader::load(None).is_err());
        });
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = ConfigLoader::load(Some(Path::new("/no/such/arbor.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
