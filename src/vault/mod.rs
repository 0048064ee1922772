//! Vault module: single-file encrypted credential storage.
//!
//! This module provides:
//! - `VaultEntry` and `VaultContent` types (`entry`)
//! - The binary vault file codec (`format`)
//! - The storage collaborator trait and backends (`storage`)
//! - The `VaultManager` lifecycle and `UnlockedVault` handle (`store`)

pub mod entry;
pub mod format;
pub mod storage;
pub mod store;

// Re-export the most commonly used items.
pub use entry::{NewEntry, VaultContent, VaultEntry};
pub use format::VaultHeader;
pub use storage::{FileStorage, MemoryStorage, VaultStorage};
pub use store::{Unlock, UnlockedVault, VaultManager, VaultState};
