//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;

use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::strength::check_password_strength;
use crate::errors::{Result, VaultError};
use crate::vault::{FileStorage, Unlock, UnlockedVault, VaultManager};

/// Environment variable consulted before prompting for the master password.
pub const PASSWORD_ENV: &str = "PASSMAN_PASSWORD";

/// Passman CLI: local encrypted password vault.
#[derive(Parser)]
#[command(name = "passman", about = "Local encrypted password vault", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data directory holding the vault and passman.toml (default: .passman)
    #[arg(long, env = "PASSMAN_DIR", default_value = ".passman", global = true)]
    pub data_dir: PathBuf,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Init,

    /// Show whether a vault exists and how its key is derived
    Status,

    /// Add a credential (password is read from stdin, prompted, or generated)
    Add {
        /// Entry title (e.g. "Bank")
        #[arg(short, long)]
        title: String,
        /// Login name
        #[arg(short, long, default_value = "")]
        username: String,
        /// Site address
        #[arg(long, default_value = "")]
        url: String,
        /// Free-form notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Generate a random 20-character password instead of reading one
        #[arg(short, long)]
        generate: bool,
    },

    /// Change fields of an existing entry
    Edit {
        /// Entry id or title
        entry: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New login name
        #[arg(short, long)]
        username: Option<String>,
        /// New site address
        #[arg(long)]
        url: Option<String>,
        /// New notes
        #[arg(short, long)]
        notes: Option<String>,
        /// Replace the password (read from stdin or prompted)
        #[arg(short, long)]
        password: bool,
    },

    /// Print the password of an entry
    Get {
        /// Entry id or title
        entry: String,
    },

    /// List entries, optionally filtered (passwords are never shown)
    List {
        /// Only show entries whose title, username or URL contains this text
        query: Option<String>,
    },

    /// Delete an entry
    Delete {
        /// Entry id or title
        entry: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Move a legacy store into a new vault file
    #[cfg(feature = "legacy-sqlite")]
    Migrate,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolve the data directory against the current directory.
pub fn data_dir(cli: &Cli) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(&cli.data_dir))
}

/// Load `passman.toml` from the data directory (defaults if absent).
pub fn load_settings(cli: &Cli) -> Result<(PathBuf, Settings)> {
    let dir = data_dir(cli)?;
    let settings = Settings::load(&dir)?;
    Ok((dir, settings))
}

/// Build a vault manager for the configured vault file.
pub fn vault_manager(cli: &Cli) -> Result<VaultManager<FileStorage>> {
    let (dir, settings) = load_settings(cli)?;
    Ok(VaultManager::with_policy(
        FileStorage::new(settings.vault_path(&dir)),
        settings.kdf_policy(),
    ))
}

/// Get the master password, trying in order:
/// 1. `PASSMAN_PASSWORD` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        return Ok(pw);
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Enter master password")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new master password with confirmation (used by `init`).
///
/// Passwords scoring below `min_score` are rejected.  From the
/// environment that is an error; interactively the user is asked again.
pub fn prompt_new_password(min_score: u8) -> Result<Zeroizing<String>> {
    if let Some(pw) = password_from_env() {
        let strength = check_password_strength(&pw);
        if strength.score < min_score {
            return Err(VaultError::WeakPassword(format!(
                "{} (score {}, need {min_score})",
                strength.message, strength.score
            )));
        }
        return Ok(pw);
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose master password")
                .with_confirmation(
                    "Confirm master password",
                    "Passwords do not match, try again",
                )
                .interact()
                .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?,
        );

        let strength = check_password_strength(&password);
        if strength.score < min_score {
            output::warning(&format!(
                "{} (score {}, need {min_score}). Try again.",
                strength.message, strength.score
            ));
            continue;
        }

        return Ok(password);
    }
}

fn password_from_env() -> Option<Zeroizing<String>> {
    match std::env::var(PASSWORD_ENV) {
        Ok(pw) if !pw.is_empty() => Some(Zeroizing::new(pw)),
        _ => None,
    }
}

/// Read an entry password from piped stdin, or prompt for it.
pub fn read_entry_password(title: &str) -> Result<Zeroizing<String>> {
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        return Ok(Zeroizing::new(
            buf.trim_end_matches(['\r', '\n']).to_string(),
        ));
    }

    let pw = dialoguer::Password::new()
        .with_prompt(format!("Password for {title}"))
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for the password and unlock the vault.
///
/// A missing vault is an error here; only `init` creates one.
pub fn unlock_vault(manager: &VaultManager<FileStorage>) -> Result<UnlockedVault> {
    let password = prompt_password()?;
    match manager.unlock(&password)? {
        Unlock::Unlocked(vault) => Ok(vault),
        Unlock::NotInitialized => Err(VaultError::VaultNotInitialized),
    }
}

/// Find an entry id by exact id, falling back to a case-insensitive
/// title match.  A title shared by several entries must be given by id.
pub fn resolve_entry(vault: &UnlockedVault, key: &str) -> Result<String> {
    if let Some(entry) = vault.find_entry(key) {
        return Ok(entry.id.clone());
    }

    let mut matches = vault
        .entries()
        .iter()
        .filter(|e| e.title.eq_ignore_ascii_case(key));

    match (matches.next(), matches.next()) {
        (Some(entry), None) => Ok(entry.id.clone()),
        (Some(_), Some(_)) => Err(VaultError::CommandFailed(format!(
            "more than one entry is titled '{key}'; use its id instead"
        ))),
        (None, _) => Err(VaultError::EntryNotFound(key.to_string())),
    }
}
