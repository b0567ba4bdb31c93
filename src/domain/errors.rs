//! Domain errors for the arbor worktree registry.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Format ambiguity candidates one per line, indented under the message.
fn format_candidates(candidates: &[String]) -> String {
    candidates
        .iter()
        .map(|c| format!("\n  {c}"))
        .collect::<String>()
}

/// Domain-level errors raised by the registry, lock and resolver.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error(
        "Timed out after {:.1}s waiting for registry lock {} (another arbor process is holding it)",
        .waited.as_secs_f64(),
        .path.display()
    )]
    LockTimeout { path: PathBuf, waited: Duration },

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error("Ambiguous target '{input}' matches {} candidates:{}", .candidates.len(), format_candidates(.candidates))]
    AmbiguousTarget {
        input: String,
        candidates: Vec<String>,
    },

    #[error("No target given: {0}")]
    TargetRequired(String),

    #[error("Invalid target '{token}': {reason}")]
    InvalidTarget { token: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Failed to replace registry file: {0}")]
    Persist(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<tempfile::PersistError> for DomainError {
    fn from(err: tempfile::PersistError) -> Self {
        DomainError::Persist(err.to_string())
    }
}
