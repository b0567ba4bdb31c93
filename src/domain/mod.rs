//! Domain layer for the arbor worktree registry
//!
//! This module contains the registry model, resolver inputs and outputs,
//! and the port traits the services depend on.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
