//! Registry persistence infrastructure
//!
//! - Advisory `flock` over a co-located lock file
//! - JSON registry file with atomic replace on save

pub mod lock;
pub mod store;

pub use lock::RegistryLock;
pub use store::{RegistryStore, LOCK_FILE, REGISTRY_FILE};
