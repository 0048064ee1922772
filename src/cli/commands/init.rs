//! `passman init`: create a new, empty vault.

use crate::cli::output;
use crate::cli::{load_settings, prompt_new_password, Cli};
use crate::errors::{Result, VaultError};
use crate::vault::{FileStorage, VaultContent, VaultManager, VaultState};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (dir, settings) = load_settings(cli)?;
    let vault_path = settings.vault_path(&dir);
    let manager = VaultManager::with_policy(
        FileStorage::new(&vault_path),
        settings.kdf_policy(),
    );

    // 1. Refuse to overwrite an existing vault.
    if manager.state()? == VaultState::Locked {
        output::tip("Use `passman add` to add entries to the existing vault.");
        return Err(VaultError::VaultAlreadyExists(vault_path.display().to_string()));
    }

    // 2. A legacy store should be migrated, not shadowed by an empty vault.
    #[cfg(feature = "legacy-sqlite")]
    {
        use crate::legacy::{LegacyStore, SqliteLegacyStore};

        let legacy = SqliteLegacyStore::open(&settings.legacy_path(&dir))?;
        if legacy.exists()? {
            output::warning("A legacy vault was found in this data directory.");
            output::tip("Run `passman migrate` to move its entries into a new vault.");
            return Err(VaultError::CommandFailed(
                "refusing to create an empty vault next to a legacy one".into(),
            ));
        }
    }

    // 3. Prompt for a new password that passes the strength gate.
    let password = prompt_new_password(settings.min_password_score)?;

    // 4. Derive the key and write the empty vault.
    let vault = manager.create(&password, VaultContent::default())?;
    output::success(&format!(
        "Vault created at {} (key derivation: {})",
        vault_path.display(),
        vault.header().kdf_algorithm()
    ));
    vault.lock();

    output::tip("Run `passman add --title <TITLE>` to add an entry.");
    output::tip("Run `passman list` to see all entries.");

    Ok(())
}
