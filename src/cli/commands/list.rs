//! `passman list`: display entries in a table.

use crate::cli::output;
use crate::cli::{unlock_vault, vault_manager, Cli};
use crate::errors::Result;

/// Execute the `list` command, showing only entries matching `query`
/// when one is given.
pub fn execute(cli: &Cli, query: Option<&str>) -> Result<()> {
    let manager = vault_manager(cli)?;
    let vault = unlock_vault(&manager)?;

    let entries = match query {
        Some(q) => vault.content().search(q),
        None => vault.content().sorted_by_title(),
    };

    if let Some(q) = query.filter(|_| entries.is_empty()) {
        output::info(&format!("No entries match '{q}'."));
        return Ok(());
    }

    output::info(&format!("{} entry(ies)", entries.len()));
    output::print_entries_table(&entries);

    Ok(())
}
