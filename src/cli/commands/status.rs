//! `passman status`: show vault state without asking for a password.

use crate::cli::output;
use crate::cli::{load_settings, Cli};
use crate::crypto::kdf::KdfParams;
use crate::errors::Result;
use crate::vault::{FileStorage, VaultManager};

/// Execute the `status` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (dir, settings) = load_settings(cli)?;
    let vault_path = settings.vault_path(&dir);
    let manager = VaultManager::new(FileStorage::new(&vault_path));

    match manager.read_header()? {
        None => {
            output::info(&format!("No vault at {}", vault_path.display()));
            output::tip("Run `passman init` to create one.");
        }
        Some(header) => {
            output::info(&format!("Vault at {} is locked", vault_path.display()));
            match &header.kdf_params {
                KdfParams::Argon2id(p) => output::info(&format!(
                    "Key derivation: argon2id (memory {} KiB, time {}, parallelism {})",
                    p.memory_kib, p.time_cost, p.parallelism
                )),
                KdfParams::Pbkdf2(p) => output::info(&format!(
                    "Key derivation: pbkdf2 ({} iterations)",
                    p.iterations
                )),
            }
        }
    }

    #[cfg(feature = "legacy-sqlite")]
    {
        use crate::legacy::{LegacyStore, SqliteLegacyStore};

        let legacy = SqliteLegacyStore::open(&settings.legacy_path(&dir))?;
        if legacy.exists()? {
            output::warning(&format!(
                "Legacy vault present at {}",
                legacy.path().display()
            ));
            output::tip("Run `passman migrate` to move it into the new format.");
        }
    }

    Ok(())
}
