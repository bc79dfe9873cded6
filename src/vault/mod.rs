//! Vault module: versioned records and the store that holds them.
//!
//! This module provides:
//! - `Record`, one named secret with its add/delete counters (`record`)
//! - The plaintext line formats records are persisted in (`format`)
//! - Where the encrypted bytes live (`backing`)
//! - `VaultStore`, which opens, edits, merges and saves a vault (`store`)

pub mod backing;
pub mod format;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use backing::{Backing, FileBacking, MemoryBacking, Sink};
pub use format::{LineError, RecordFormat};
pub use record::Record;
pub use store::VaultStore;
