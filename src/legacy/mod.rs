//! The legacy per-record encrypted store, read only for migration.
//!
//! Before the single-file format, Passman kept its data in a key-value
//! database: a master salt and a verification blob in a `metadata`
//! table, and one row per credential in an `entries` table.  Only each
//! record's password was encrypted (AES-256-GCM under a PBKDF2 key with
//! 250 000 iterations); every other field was plaintext.
//!
//! This module provides:
//! - The `LegacyStore` collaborator contract and record types (here)
//! - An SQLite-backed store (`sqlite`, feature `legacy-sqlite`)
//! - The one-shot migration into the new format (`migration`)

pub mod migration;
#[cfg(feature = "legacy-sqlite")]
pub mod sqlite;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::crypto::encryption::{decrypt, encrypt};
use crate::crypto::kdf::{derive_key, KdfParams, Pbkdf2Params};
use crate::crypto::keys::MasterKey;
use crate::errors::{Result, VaultError};
use crate::vault::format::{base64_decode, base64_encode};

pub use migration::{migrate, needs_migration, MigrationOutcome, MigrationReport, MigrationStep};
#[cfg(feature = "legacy-sqlite")]
pub use sqlite::SqliteLegacyStore;

/// PBKDF2-HMAC-SHA256 iteration count used by every legacy store.
pub const LEGACY_PBKDF2_ITERATIONS: u32 = 250_000;

/// Known plaintext of the verification blob.
pub const VERIFICATION_SENTINEL: &str = "VAULT_OK";

/// Collaborator contract for a legacy store.
///
/// Implementations are explicit handles: the caller opens one, passes it
/// to every operation, and it is released when dropped.
pub trait LegacyStore {
    /// Returns `true` if a legacy vault is present.
    fn exists(&self) -> Result<bool>;

    /// Derive the legacy key and check it against the verification blob.
    ///
    /// Returns `Ok(None)` for a wrong password.
    fn unlock(&self, password: &str) -> Result<Option<LegacyKey>>;

    /// Read every record, decrypting each password individually.
    fn list_all(&self, key: &LegacyKey) -> Result<Vec<LegacyEntry>>;

    /// Delete the legacy store.  Callers treat failure as non-fatal.
    fn destroy(&mut self) -> Result<()>;
}

/// Key derived from the master password with the legacy scheme.
#[derive(Debug)]
pub struct LegacyKey(MasterKey);

impl LegacyKey {
    /// Derive the legacy key from `password` and the store's salt.
    pub fn derive(password: &str, salt: &[u8]) -> Result<Self> {
        let params = KdfParams::Pbkdf2(Pbkdf2Params {
            iterations: LEGACY_PBKDF2_ITERATIONS,
            salt: salt.to_vec(),
        });
        derive_key(password.as_bytes(), &params).map(Self)
    }

    /// Returns `true` if `verification` decrypts to the sentinel.
    pub fn verifies(&self, verification: &EncryptedField) -> bool {
        match verification.open(self) {
            Ok(plain) => plain.as_bytes().ct_eq(VERIFICATION_SENTINEL.as_bytes()).into(),
            Err(_) => false,
        }
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<MasterKey> for LegacyKey {
    fn from(key: MasterKey) -> Self {
        Self(key)
    }
}

/// A separately encrypted value: `{ "iv": b64, "encryptedData": b64 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedField {
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub iv: Vec<u8>,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub encrypted_data: Vec<u8>,
}

impl EncryptedField {
    /// Encrypt a UTF-8 value under a fresh nonce.
    pub fn seal(key: &LegacyKey, plaintext: &str) -> Result<Self> {
        let sealed = encrypt(key.as_bytes(), plaintext.as_bytes())?;
        Ok(Self {
            iv: sealed.nonce.to_vec(),
            encrypted_data: sealed.ciphertext,
        })
    }

    /// Decrypt back to a UTF-8 value.
    pub fn open(&self, key: &LegacyKey) -> Result<String> {
        let plain = decrypt(key.as_bytes(), &self.iv, &self.encrypted_data)?;
        String::from_utf8(plain).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            VaultError::LegacyStore("decrypted value is not valid UTF-8".into())
        })
    }
}

/// A legacy row as stored: password still encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRecord {
    pub id: i64,
    pub title: String,
    pub username: String,
    pub encrypted_password: EncryptedField,
    pub url: String,
    pub notes: String,
}

impl LegacyRecord {
    /// Decrypt this record's password.
    pub fn decrypt(self, key: &LegacyKey) -> Result<LegacyEntry> {
        let password = self.encrypted_password.open(key)?;
        Ok(LegacyEntry {
            id: Some(self.id),
            title: self.title,
            username: self.username,
            password,
            url: self.url,
            notes: self.notes,
        })
    }
}

/// A legacy record with its password decrypted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyEntry {
    /// Row id in the legacy store; not carried into the new format.
    pub id: Option<i64>,
    pub title: String,
    pub username: String,
    pub password: String,
    pub url: String,
    pub notes: String,
}
