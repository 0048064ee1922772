//! `passman migrate`: move a legacy store into a new vault file.

use crate::cli::output;
use crate::cli::{load_settings, prompt_password, Cli};
use crate::errors::Result;
use crate::legacy::{migrate, MigrationOutcome, SqliteLegacyStore};
use crate::vault::{FileStorage, VaultManager};

/// Execute the `migrate` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (dir, settings) = load_settings(cli)?;
    let manager = VaultManager::with_policy(
        FileStorage::new(settings.vault_path(&dir)),
        settings.kdf_policy(),
    );
    let mut legacy = SqliteLegacyStore::open(&settings.legacy_path(&dir))?;

    // The legacy master password becomes the new vault's password.
    let password = prompt_password()?;

    match migrate(&manager, &mut legacy, &password)? {
        MigrationOutcome::NotNeeded => {
            output::info("Nothing to migrate.");
        }
        MigrationOutcome::Migrated(report) => {
            output::success(&format!(
                "Migrated {} entry(ies) into {} (key derivation: {})",
                report.entries_migrated,
                manager.storage().path().display(),
                report.vault.header().kdf_algorithm()
            ));
            if !report.legacy_retired {
                output::warning(&format!(
                    "Could not remove the legacy store at {}; delete it manually.",
                    legacy.path().display()
                ));
            }
            report.vault.lock();
        }
    }

    Ok(())
}
