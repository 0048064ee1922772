//! `passman edit`: change fields of an existing entry.

use crate::cli::output;
use crate::cli::{read_entry_password, resolve_entry, unlock_vault, vault_manager, Cli};
use crate::errors::{Result, VaultError};

/// Replacement values from the command line; `None` keeps the field.
pub struct EditArgs<'a> {
    pub title: Option<&'a str>,
    pub username: Option<&'a str>,
    pub url: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub password: bool,
}

impl EditArgs<'_> {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.username.is_none()
            && self.url.is_none()
            && self.notes.is_none()
            && !self.password
    }
}

/// Execute the `edit` command.
pub fn execute(cli: &Cli, key: &str, args: EditArgs<'_>) -> Result<()> {
    if args.is_empty() {
        return Err(VaultError::CommandFailed(
            "nothing to change; pass --title, --username, --url, --notes or --password".into(),
        ));
    }
    if matches!(args.title, Some(t) if t.trim().is_empty()) {
        return Err(VaultError::CommandFailed("title cannot be empty".into()));
    }

    let manager = vault_manager(cli)?;
    let mut vault = unlock_vault(&manager)?;
    let id = resolve_entry(&vault, key)?;
    let mut entry = vault
        .find_entry(&id)
        .cloned()
        .ok_or_else(|| VaultError::EntryNotFound(key.to_string()))?;

    if let Some(title) = args.title {
        entry.title = title.to_string();
    }
    if let Some(username) = args.username {
        entry.username = username.to_string();
    }
    if let Some(url) = args.url {
        entry.url = url.to_string();
    }
    if let Some(notes) = args.notes {
        entry.notes = notes.to_string();
    }
    if args.password {
        entry.password = read_entry_password(&entry.title)?.to_string();
    }

    let title = entry.title.clone();
    vault.update_entry(entry)?;
    vault.save(&manager)?;

    output::success(&format!("Updated '{title}'"));

    Ok(())
}
