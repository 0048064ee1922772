//! Vault lifecycle: create, unlock, save, lock.
//!
//! `VaultManager` wraps the storage collaborator, the file codec and the
//! crypto layer.  A vault moves through three states:
//!
//! ```text
//! Uninitialized --create--> Locked --unlock--> Unlocked --lock--> Locked
//! ```
//!
//! `Uninitialized` and `Locked` are reported by [`VaultManager::state`];
//! `Unlocked` is an [`UnlockedVault`] value that owns the derived key.
//! Locking consumes the value, which wipes the key.

use std::fmt;

use zeroize::Zeroizing;

use crate::crypto::encryption::{decrypt, encrypt, Sealed};
use crate::crypto::kdf::{derive_for_new_vault, derive_key, KdfPolicy};
use crate::crypto::keys::MasterKey;
use crate::errors::{Result, VaultError};

use super::entry::{NewEntry, VaultContent, VaultEntry};
use super::format::{self, VaultHeader};
use super::storage::VaultStorage;

/// What storage says about the vault before any password is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// No vault has been written yet.
    Uninitialized,
    /// A vault exists and needs a password.
    Locked,
}

/// Result of a successful unlock attempt.
#[derive(Debug)]
pub enum Unlock {
    /// There is nothing to unlock; the caller should offer vault creation.
    NotInitialized,
    Unlocked(UnlockedVault),
}

/// The vault handle.  Create one per storage location.
pub struct VaultManager<S: VaultStorage> {
    storage: S,
    policy: KdfPolicy,
}

impl<S: VaultStorage> VaultManager<S> {
    /// A manager that creates new vaults with the default KDF policy.
    pub fn new(storage: S) -> Self {
        Self::with_policy(storage, KdfPolicy::default())
    }

    /// A manager with an explicit KDF policy for new vaults.
    pub fn with_policy(storage: S, policy: KdfPolicy) -> Self {
        Self { storage, policy }
    }

    /// Returns the storage collaborator.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the KDF policy applied to new vaults.
    pub fn policy(&self) -> &KdfPolicy {
        &self.policy
    }

    /// Whether a vault has been created yet.
    pub fn state(&self) -> Result<VaultState> {
        if self.storage.exists()? {
            Ok(VaultState::Locked)
        } else {
            Ok(VaultState::Uninitialized)
        }
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Create a brand-new vault holding `initial_content`.
    ///
    /// Chooses the KDF per the manager's policy, derives the key from a
    /// fresh salt, encrypts the content under a fresh nonce and writes
    /// the encoded file.  The returned vault is already unlocked; its key
    /// is the same key a later `unlock` derives.
    pub fn create(&self, password: &str, initial_content: VaultContent) -> Result<UnlockedVault> {
        if self.storage.exists()? {
            return Err(VaultError::VaultAlreadyExists(self.storage.describe()));
        }

        let (kdf_params, key) = derive_for_new_vault(password.as_bytes(), &self.policy)?;

        let mut content = initial_content;
        content.assign_missing_ids();

        let sealed = seal(&key, &content)?;
        let header = VaultHeader {
            kdf_params,
            iv: sealed.nonce,
        };

        self.storage
            .write(&format::encode(&header, &sealed.ciphertext)?)?;

        tracing::info!(
            kdf = %header.kdf_algorithm(),
            entries = content.entries.len(),
            location = %self.storage.describe(),
            "vault created"
        );

        Ok(UnlockedVault {
            key,
            header,
            content,
        })
    }

    // ------------------------------------------------------------------
    // Unlock
    // ------------------------------------------------------------------

    /// Unlock the stored vault with `password`.
    ///
    /// Returns `Unlock::NotInitialized` if there is no vault.  Storage
    /// errors propagate as-is.  Every other failure (bad framing, KDF
    /// error, authentication failure, unreadable content) is reported as
    /// `InvalidPassword`: the only useful reaction is to try another
    /// password, so the cause is only logged.
    ///
    /// The key is always derived with the exact parameters stored in the
    /// header.  No other algorithm is ever tried.
    pub fn unlock(&self, password: &str) -> Result<Unlock> {
        let Some(data) = self.storage.read()? else {
            return Ok(Unlock::NotInitialized);
        };

        match open_vault(password.as_bytes(), &data) {
            Ok(vault) => Ok(Unlock::Unlocked(vault)),
            Err(e) => {
                tracing::debug!(error = %e, "vault unlock failed");
                Err(VaultError::InvalidPassword)
            }
        }
    }

    /// Read the plaintext header without a password.
    pub fn read_header(&self) -> Result<Option<VaultHeader>> {
        match self.storage.read()? {
            Some(data) => format::decode_header(&data).map(Some),
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------

    /// Re-encrypt `content` under `key` and rewrite the whole vault.
    ///
    /// A new nonce is drawn for every save; the returned header is
    /// `header` with that nonce and must be used for the next save.
    /// Entries without an id get one before anything is written.
    pub fn save(
        &self,
        key: &MasterKey,
        content: &mut VaultContent,
        header: &VaultHeader,
    ) -> Result<VaultHeader> {
        content.assign_missing_ids();

        let sealed = seal(key, content)?;
        let new_header = header.with_iv(sealed.nonce);

        self.storage
            .write(&format::encode(&new_header, &sealed.ciphertext)?)?;

        tracing::debug!(entries = content.entries.len(), "vault saved");

        Ok(new_header)
    }
}

/// Serialize and encrypt the content, wiping the plaintext afterwards.
fn seal(key: &MasterKey, content: &VaultContent) -> Result<Sealed> {
    let plaintext = Zeroizing::new(
        serde_json::to_vec(content)
            .map_err(|e| VaultError::SerializationError(format!("vault content: {e}")))?,
    );
    encrypt(key.as_bytes(), &plaintext)
}

fn open_vault(password: &[u8], data: &[u8]) -> Result<UnlockedVault> {
    let (header, ciphertext) = format::decode(data)?;
    let key = derive_key(password, &header.kdf_params)?;

    let plaintext = Zeroizing::new(decrypt(key.as_bytes(), &header.iv, ciphertext)?);
    let content: VaultContent = serde_json::from_slice(&plaintext)
        .map_err(|e| VaultError::SerializationError(format!("vault content: {e}")))?;

    Ok(UnlockedVault {
        key,
        header,
        content,
    })
}

// ----------------------------------------------------------------------
// UnlockedVault
// ----------------------------------------------------------------------

/// An unlocked vault: the derived key, the current header and the
/// decrypted content.
///
/// Entry operations only change the in-memory content; call
/// [`UnlockedVault::save`] to persist them.  `save` takes `&mut self`, so
/// a handle can never have two saves in flight.
pub struct UnlockedVault {
    key: MasterKey,
    header: VaultHeader,
    content: VaultContent,
}

impl UnlockedVault {
    /// The derived key (zeroized when the vault is dropped or locked).
    pub fn key(&self) -> &MasterKey {
        &self.key
    }

    /// The header of the most recent write.
    pub fn header(&self) -> &VaultHeader {
        &self.header
    }

    pub fn content(&self) -> &VaultContent {
        &self.content
    }

    pub fn entries(&self) -> &[VaultEntry] {
        &self.content.entries
    }

    /// Look up an entry by id.
    pub fn find_entry(&self, id: &str) -> Option<&VaultEntry> {
        self.content.entries.iter().find(|e| e.id == id)
    }

    /// Add a new entry and return its generated id.
    pub fn add_entry(&mut self, entry: NewEntry) -> String {
        let entry = entry.into_entry();
        let id = entry.id.clone();
        self.content.entries.push(entry);
        id
    }

    /// Replace the entry with the same id.
    pub fn update_entry(&mut self, entry: VaultEntry) -> Result<()> {
        let slot = self
            .content
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| VaultError::EntryNotFound(entry.id.clone()))?;
        *slot = entry;
        Ok(())
    }

    /// Remove an entry by id, returning it.
    pub fn remove_entry(&mut self, id: &str) -> Result<VaultEntry> {
        let index = self
            .content
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| VaultError::EntryNotFound(id.to_string()))?;
        Ok(self.content.entries.remove(index))
    }

    /// Persist the current content through `manager`.
    pub fn save<S: VaultStorage>(&mut self, manager: &VaultManager<S>) -> Result<()> {
        self.header = manager.save(&self.key, &mut self.content, &self.header)?;
        Ok(())
    }

    /// Lock the vault, wiping the key from memory.
    pub fn lock(self) {
        drop(self);
    }
}

impl fmt::Debug for UnlockedVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnlockedVault")
            .field("kdf", &self.header.kdf_algorithm())
            .field("entries", &self.content.entries.len())
            .finish_non_exhaustive()
    }
}
