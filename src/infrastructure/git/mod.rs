//! Git adapters.

pub mod cli;

pub use cli::{GitCli, LABEL_CONFIG_KEY};
