//! One-shot migration from the legacy store into a new vault file.
//!
//! Steps, in order:
//!
//! ```text
//! CheckLegacy -> UnlockLegacy -> ReadLegacyEntries -> BuildNewContent
//!   -> CreateNewVault -> RetireLegacyStore -> Done
//! ```
//!
//! The new vault is the source of truth as soon as `CreateNewVault`
//! succeeds.  Every failure before that point leaves both stores exactly
//! as they were; a failure to delete the legacy store afterwards is only
//! logged.  Once the new vault exists, `CheckLegacy` skips migration
//! without reading the legacy store at all.

use std::fmt;

use crate::errors::{Result, VaultError};
use crate::vault::entry::{NewEntry, VaultContent};
use crate::vault::storage::VaultStorage;
use crate::vault::store::{UnlockedVault, VaultManager, VaultState};

use super::{LegacyEntry, LegacyStore};

/// A step of the migration, used to report where it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    CheckLegacy,
    UnlockLegacy,
    ReadLegacyEntries,
    BuildNewContent,
    CreateNewVault,
    RetireLegacyStore,
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CheckLegacy => "checking for a legacy vault",
            Self::UnlockLegacy => "unlocking the legacy vault",
            Self::ReadLegacyEntries => "reading legacy entries",
            Self::BuildNewContent => "building the new vault content",
            Self::CreateNewVault => "creating the new vault",
            Self::RetireLegacyStore => "removing the legacy vault",
        };
        f.write_str(s)
    }
}

/// What a migration run did.
#[derive(Debug)]
pub enum MigrationOutcome {
    /// A new vault already exists, or there is no legacy store.
    NotNeeded,
    Migrated(MigrationReport),
}

/// Details of a completed migration.
#[derive(Debug)]
pub struct MigrationReport {
    /// Number of legacy records copied into the new vault.
    pub entries_migrated: usize,
    /// `false` if the legacy store could not be deleted.
    pub legacy_retired: bool,
    /// The newly created vault, already unlocked.
    pub vault: UnlockedVault,
}

/// Returns `true` if a legacy store exists and no new vault does.
///
/// The new vault is checked first; if it exists the legacy store is not
/// touched.
pub fn needs_migration<S, L>(manager: &VaultManager<S>, legacy: &L) -> Result<bool>
where
    S: VaultStorage,
    L: LegacyStore,
{
    if manager.state()? == VaultState::Locked {
        return Ok(false);
    }
    legacy.exists()
}

/// Migrate the legacy store into a new vault protected by the same
/// master `password`.
pub fn migrate<S, L>(
    manager: &VaultManager<S>,
    legacy: &mut L,
    password: &str,
) -> Result<MigrationOutcome>
where
    S: VaultStorage,
    L: LegacyStore,
{
    // CheckLegacy
    if !needs_migration(manager, legacy).map_err(at(MigrationStep::CheckLegacy))? {
        tracing::debug!("no migration needed");
        return Ok(MigrationOutcome::NotNeeded);
    }

    // UnlockLegacy
    let key = legacy
        .unlock(password)
        .map_err(at(MigrationStep::UnlockLegacy))?
        .ok_or(VaultError::InvalidLegacyPassword)?;

    // ReadLegacyEntries
    let old_entries = legacy
        .list_all(&key)
        .map_err(at(MigrationStep::ReadLegacyEntries))?;
    drop(key);
    tracing::info!(count = old_entries.len(), "read legacy entries");

    // BuildNewContent
    let content = build_content(old_entries);
    let entries_migrated = content.entries.len();

    // CreateNewVault
    let vault = manager
        .create(password, content)
        .map_err(at(MigrationStep::CreateNewVault))?;

    // RetireLegacyStore
    let legacy_retired = match legacy.destroy() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                error = %e,
                "could not remove legacy store; new vault is already in place"
            );
            false
        }
    };

    tracing::info!(entries_migrated, legacy_retired, "migration complete");

    Ok(MigrationOutcome::Migrated(MigrationReport {
        entries_migrated,
        legacy_retired,
        vault,
    }))
}

/// Map each legacy record to a new entry with a freshly generated id.
fn build_content(old_entries: Vec<LegacyEntry>) -> VaultContent {
    let entries = old_entries
        .into_iter()
        .map(|old| {
            NewEntry {
                title: old.title,
                username: old.username,
                password: old.password,
                url: old.url,
                notes: old.notes,
            }
            .into_entry()
        })
        .collect();

    VaultContent { entries }
}

fn at(step: MigrationStep) -> impl FnOnce(VaultError) -> VaultError {
    move |source| VaultError::Migration {
        step,
        source: Box::new(source),
    }
}
