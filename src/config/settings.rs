use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::{
    Argon2Cost, KdfAlgorithm, KdfPolicy, DEFAULT_ARGON2_MEMORY_KIB, DEFAULT_ARGON2_PARALLELISM,
    DEFAULT_ARGON2_TIME_COST, DEFAULT_PBKDF2_ITERATIONS,
};
use crate::errors::{Result, VaultError};

/// Data-directory configuration, loaded from `passman.toml`.
///
/// Every field has a default, so Passman works without a config file.
/// The KDF fields only affect vault creation; an existing vault always
/// uses the parameters stored in its header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Vault file name, relative to the data directory.
    #[serde(default = "default_vault_file")]
    pub vault_file: String,

    /// Legacy store file name, relative to the data directory.
    #[serde(default = "default_legacy_store")]
    pub legacy_store: String,

    /// Pin the KDF for new vaults (`"argon2id"` or `"pbkdf2"`).
    /// Unset means Argon2id with PBKDF2 as fallback.
    #[serde(default)]
    pub kdf: Option<KdfAlgorithm>,

    /// Argon2id memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2id iteration count (default: 3).
    #[serde(default = "default_argon2_time_cost")]
    pub argon2_time_cost: u32,

    /// Argon2id lanes (default: 1).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// PBKDF2-HMAC-SHA256 iterations (default: 310 000).
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Minimum strength score (0-100) accepted by `init`.
    #[serde(default = "default_min_password_score")]
    pub min_password_score: u8,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_file() -> String {
    "vault.bin".to_string()
}

fn default_legacy_store() -> String {
    "legacy.sqlite3".to_string()
}

fn default_argon2_memory_kib() -> u32 {
    DEFAULT_ARGON2_MEMORY_KIB
}

fn default_argon2_time_cost() -> u32 {
    DEFAULT_ARGON2_TIME_COST
}

fn default_argon2_parallelism() -> u32 {
    DEFAULT_ARGON2_PARALLELISM
}

fn default_pbkdf2_iterations() -> u32 {
    DEFAULT_PBKDF2_ITERATIONS
}

fn default_min_password_score() -> u8 {
    50
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_file: default_vault_file(),
            legacy_store: default_legacy_store(),
            kdf: None,
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_time_cost: default_argon2_time_cost(),
            argon2_parallelism: default_argon2_parallelism(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            min_password_score: default_min_password_score(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the data directory.
    pub const FILE_NAME: &'static str = "passman.toml";

    /// Load settings from `<data_dir>/passman.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.min_password_score > 100 {
            return Err(VaultError::ConfigError(format!(
                "min_password_score must be between 0 and 100, got {}",
                settings.min_password_score
            )));
        }

        Ok(settings)
    }

    /// Full path of the vault file, e.g. `.passman/vault.bin`.
    pub fn vault_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.vault_file)
    }

    /// Full path of the legacy store, e.g. `.passman/legacy.sqlite3`.
    pub fn legacy_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.legacy_store)
    }

    /// Convert the KDF settings into the policy used for new vaults.
    pub fn kdf_policy(&self) -> KdfPolicy {
        KdfPolicy {
            pinned: self.kdf,
            argon2: Argon2Cost {
                memory_kib: self.argon2_memory_kib,
                time_cost: self.argon2_time_cost,
                parallelism: self.argon2_parallelism,
            },
            pbkdf2_iterations: self.pbkdf2_iterations,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.vault_file, "vault.bin");
        assert_eq!(s.legacy_store, "legacy.sqlite3");
        assert_eq!(s.kdf, None);
        assert_eq!(s.argon2_memory_kib, 65_536);
        assert_eq!(s.argon2_time_cost, 3);
        assert_eq!(s.argon2_parallelism, 1);
        assert_eq!(s.pbkdf2_iterations, 310_000);
        assert_eq!(s.min_password_score, 50);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_file, "vault.bin");
        assert_eq!(settings.kdf_policy(), KdfPolicy::default());
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
vault_file = "main.vault"
kdf = "pbkdf2"
argon2_memory_kib = 131072
argon2_time_cost = 5
argon2_parallelism = 2
pbkdf2_iterations = 600000
min_password_score = 80
"#;
        fs::write(tmp.path().join("passman.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_file, "main.vault");
        assert_eq!(settings.kdf, Some(KdfAlgorithm::Pbkdf2));
        assert_eq!(settings.argon2_memory_kib, 131_072);
        assert_eq!(settings.argon2_time_cost, 5);
        assert_eq!(settings.argon2_parallelism, 2);
        assert_eq!(settings.pbkdf2_iterations, 600_000);
        assert_eq!(settings.min_password_score, 80);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("passman.toml"), "kdf = \"argon2id\"\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.kdf, Some(KdfAlgorithm::Argon2id));
        // Rest should be defaults
        assert_eq!(settings.legacy_store, "legacy.sqlite3");
        assert_eq!(settings.argon2_time_cost, 3);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("passman.toml"), "not valid {{toml").unwrap();

        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_unknown_kdf_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("passman.toml"), "kdf = \"scrypt\"\n").unwrap();

        let err = Settings::load(tmp.path()).unwrap_err();
        assert!(matches!(err, VaultError::ConfigError(_)));
    }

    #[test]
    fn load_rejects_score_above_100() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("passman.toml"), "min_password_score = 150\n").unwrap();

        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn paths_are_relative_to_data_dir() {
        let s = Settings::default();
        let data_dir = Path::new("/home/user/.passman");
        assert_eq!(
            s.vault_path(data_dir),
            PathBuf::from("/home/user/.passman/vault.bin")
        );
        assert_eq!(
            s.legacy_path(data_dir),
            PathBuf::from("/home/user/.passman/legacy.sqlite3")
        );
    }

    #[test]
    fn kdf_policy_carries_pin_and_costs() {
        let s = Settings {
            kdf: Some(KdfAlgorithm::Argon2id),
            argon2_memory_kib: 8192,
            argon2_time_cost: 1,
            pbkdf2_iterations: 10_000,
            ..Settings::default()
        };
        let policy = s.kdf_policy();
        assert_eq!(policy.pinned, Some(KdfAlgorithm::Argon2id));
        assert_eq!(policy.argon2.memory_kib, 8192);
        assert_eq!(policy.argon2.time_cost, 1);
        assert_eq!(policy.argon2.parallelism, 1);
        assert_eq!(policy.pbkdf2_iterations, 10_000);
    }
}
