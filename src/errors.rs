use thiserror::Error;

use crate::legacy::migration::MigrationStep;

/// All errors that can occur in Passman.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Vault errors ---
    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    #[error("Invalid password or corrupted vault")]
    InvalidPassword,

    #[error("No vault has been created yet")]
    VaultNotInitialized,

    #[error("A vault already exists at {0}")]
    VaultAlreadyExists(String),

    #[error("Entry '{0}' not found")]
    EntryNotFound(String),

    #[error("Password is too weak: {0}")]
    WeakPassword(String),

    // --- Storage errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Legacy store / migration errors ---
    #[error("Invalid password for the legacy vault")]
    InvalidLegacyPassword,

    #[error("Legacy store error: {0}")]
    LegacyStore(String),

    #[error("Migration failed while {step}: {source}")]
    Migration {
        step: MigrationStep,
        #[source]
        source: Box<VaultError>,
    },

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for Passman results.
pub type Result<T> = std::result::Result<T, VaultError>;
