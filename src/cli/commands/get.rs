//! `passman get`: print the password of a single entry.

use crate::cli::{resolve_entry, unlock_vault, vault_manager, Cli};
use crate::errors::{Result, VaultError};

/// Execute the `get` command.
pub fn execute(cli: &Cli, key: &str) -> Result<()> {
    let manager = vault_manager(cli)?;
    let vault = unlock_vault(&manager)?;

    let id = resolve_entry(&vault, key)?;
    let entry = vault
        .find_entry(&id)
        .ok_or_else(|| VaultError::EntryNotFound(key.to_string()))?;

    // Print only the password to stdout so it can be piped.
    println!("{}", entry.password);

    Ok(())
}
