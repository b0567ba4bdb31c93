//! CLI command implementations.

pub mod exec;
pub mod gc;
pub mod label;
pub mod list;
pub mod note;
pub mod path;
pub mod pr;
pub mod prune;
pub mod remove;
pub mod reset;
pub mod show;
pub mod sync;
