//! `passman delete`: remove an entry from the vault.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{resolve_entry, unlock_vault, vault_manager, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, key: &str, force: bool) -> Result<()> {
    let manager = vault_manager(cli)?;
    let mut vault = unlock_vault(&manager)?;
    let id = resolve_entry(&vault, key)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete entry '{key}'?"))
            .default(false)
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            return Err(VaultError::UserCancelled);
        }
    }

    let removed = vault.remove_entry(&id)?;
    vault.save(&manager)?;

    output::success(&format!("Deleted entry '{}'", removed.title));

    Ok(())
}
