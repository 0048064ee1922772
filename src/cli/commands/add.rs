//! `passman add`: add a credential to the vault.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{read_entry_password, unlock_vault, vault_manager, Cli};
use crate::crypto::{generate_password, DEFAULT_GENERATED_LEN};
use crate::errors::{Result, VaultError};
use crate::vault::NewEntry;

/// Fields of the entry to add, as given on the command line.
pub struct AddArgs<'a> {
    pub title: &'a str,
    pub username: &'a str,
    pub url: &'a str,
    pub notes: &'a str,
    pub generate: bool,
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, args: AddArgs<'_>) -> Result<()> {
    let title = args.title;
    if title.trim().is_empty() {
        return Err(VaultError::CommandFailed("title cannot be empty".into()));
    }

    let manager = vault_manager(cli)?;

    let password = if args.generate {
        Zeroizing::new(generate_password(DEFAULT_GENERATED_LEN))
    } else {
        read_entry_password(title)?
    };

    let mut vault = unlock_vault(&manager)?;
    let id = vault.add_entry(NewEntry {
        title: title.to_string(),
        username: args.username.to_string(),
        password: password.to_string(),
        url: args.url.to_string(),
        notes: args.notes.to_string(),
    });
    vault.save(&manager)?;

    output::success(&format!(
        "Added '{title}' ({} total)",
        vault.entries().len()
    ));
    output::info(&format!("Id: {id}"));
    if args.generate {
        output::tip(&format!(
            "Generated a {}-character password. Run `passman get {id}` to see it.",
            password.len()
        ));
    }

    Ok(())
}
