//! Integration tests for the Passman vault lifecycle.

use std::fs;
use std::io;

use passman::crypto::kdf::{MIN_MEMORY_KIB, MIN_PBKDF2_ITERATIONS};
use passman::crypto::{
    encrypt, Argon2Cost, Argon2idParams, KdfAlgorithm, KdfParams, KdfPolicy, Pbkdf2Params,
};
use passman::errors::{Result, VaultError};
use passman::vault::format;
use passman::vault::{
    FileStorage, MemoryStorage, NewEntry, Unlock, UnlockedVault, VaultContent, VaultEntry,
    VaultHeader, VaultManager, VaultState, VaultStorage,
};
use tempfile::TempDir;

const PASSWORD: &str = "Tr0ub4dor&3xtra!";

fn cheap_policy(pinned: Option<KdfAlgorithm>) -> KdfPolicy {
    KdfPolicy {
        pinned,
        argon2: Argon2Cost {
            memory_kib: MIN_MEMORY_KIB,
            time_cost: 1,
            parallelism: 1,
        },
        pbkdf2_iterations: MIN_PBKDF2_ITERATIONS,
    }
}

fn manager(pinned: Option<KdfAlgorithm>) -> VaultManager<MemoryStorage> {
    VaultManager::with_policy(MemoryStorage::new(), cheap_policy(pinned))
}

fn unlocked<S: VaultStorage>(m: &VaultManager<S>, password: &str) -> UnlockedVault {
    match m.unlock(password).expect("unlock") {
        Unlock::Unlocked(vault) => vault,
        Unlock::NotInitialized => panic!("vault should exist"),
    }
}

fn bank_entry() -> NewEntry {
    NewEntry {
        title: "Bank".into(),
        username: "alice".into(),
        password: "p@ss".into(),
        url: "https://bank.example".into(),
        notes: String::new(),
    }
}

// ---------------------------------------------------------------------------
// Create and unlock round-trip
// ---------------------------------------------------------------------------

#[test]
fn create_and_unlock_roundtrip_for_both_kdfs() {
    for algorithm in [KdfAlgorithm::Argon2id, KdfAlgorithm::Pbkdf2] {
        let m = manager(Some(algorithm));
        let content = VaultContent {
            entries: vec![bank_entry().into_entry()],
        };

        let created = m.create(PASSWORD, content.clone()).unwrap();
        assert_eq!(created.header().kdf_algorithm(), algorithm);

        let vault = unlocked(&m, PASSWORD);
        assert_eq!(vault.content(), &content);
        assert_eq!(vault.key().as_bytes(), created.key().as_bytes());
    }
}

#[test]
fn wrong_password_fails_for_both_kdfs() {
    for algorithm in [KdfAlgorithm::Argon2id, KdfAlgorithm::Pbkdf2] {
        let m = manager(Some(algorithm));
        m.create(PASSWORD, VaultContent::default()).unwrap();

        let err = m.unlock("not-the-password").unwrap_err();
        assert!(matches!(err, VaultError::InvalidPassword), "{algorithm}");
    }
}

#[test]
fn unlock_without_vault_reports_not_initialized() {
    let m = manager(None);
    assert_eq!(m.state().unwrap(), VaultState::Uninitialized);
    assert!(matches!(
        m.unlock(PASSWORD).unwrap(),
        Unlock::NotInitialized
    ));
    assert!(m.read_header().unwrap().is_none());
}

#[test]
fn create_refuses_to_overwrite() {
    let m = manager(Some(KdfAlgorithm::Pbkdf2));
    m.create(PASSWORD, VaultContent::default()).unwrap();

    let err = m.create("another password", VaultContent::default()).unwrap_err();
    assert!(matches!(err, VaultError::VaultAlreadyExists(_)));

    // The original vault is untouched.
    unlocked(&m, PASSWORD);
    assert_eq!(m.storage().write_count(), 1);
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

#[test]
fn add_save_unlock_scenario() {
    let m = manager(None);
    m.create(PASSWORD, VaultContent::default()).unwrap().lock();

    let mut vault = unlocked(&m, PASSWORD);
    let id = vault.add_entry(bank_entry());
    vault.save(&m).unwrap();
    vault.lock();

    let vault = unlocked(&m, PASSWORD);
    assert_eq!(vault.entries().len(), 1);
    let entry = &vault.entries()[0];
    assert!(!entry.id.is_empty());
    assert_eq!(entry.id, id);
    assert_eq!(entry.title, "Bank");
    assert_eq!(entry.username, "alice");
    assert_eq!(entry.password, "p@ss");
    assert_eq!(entry.url, "https://bank.example");
}

#[test]
fn every_save_uses_a_new_iv_and_keeps_kdf_params() {
    let m = manager(Some(KdfAlgorithm::Pbkdf2));
    let mut vault = m.create(PASSWORD, VaultContent::default()).unwrap();
    let first = m.read_header().unwrap().unwrap();

    vault.save(&m).unwrap();
    let second = m.read_header().unwrap().unwrap();
    vault.save(&m).unwrap();
    let third = m.read_header().unwrap().unwrap();

    assert_ne!(first.iv, second.iv);
    assert_ne!(second.iv, third.iv);
    assert_eq!(first.kdf_params, third.kdf_params);
    assert_eq!(vault.header(), &third);
}

#[test]
fn save_assigns_ids_to_entries_without_one() {
    let m = manager(Some(KdfAlgorithm::Pbkdf2));
    let content = VaultContent {
        entries: vec![VaultEntry {
            id: String::new(),
            title: "Imported".into(),
            username: String::new(),
            password: "x".into(),
            url: String::new(),
            notes: String::new(),
        }],
    };

    let vault = m.create(PASSWORD, content).unwrap();
    assert!(!vault.entries()[0].id.is_empty());
}

#[test]
fn update_and_remove_entries() {
    let m = manager(Some(KdfAlgorithm::Pbkdf2));
    let mut vault = m.create(PASSWORD, VaultContent::default()).unwrap();
    let id = vault.add_entry(bank_entry());

    let mut changed = vault.find_entry(&id).unwrap().clone();
    changed.password = "n3w-p@ss".into();
    vault.update_entry(changed).unwrap();
    vault.save(&m).unwrap();

    let mut vault = unlocked(&m, PASSWORD);
    assert_eq!(vault.find_entry(&id).unwrap().password, "n3w-p@ss");

    let removed = vault.remove_entry(&id).unwrap();
    assert_eq!(removed.title, "Bank");
    assert!(matches!(
        vault.remove_entry(&id),
        Err(VaultError::EntryNotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// KDF selection at creation
// ---------------------------------------------------------------------------

#[test]
fn unusable_argon2_cost_falls_back_to_pbkdf2_when_unpinned() {
    let mut policy = cheap_policy(None);
    policy.argon2.memory_kib = 1024;
    let m = VaultManager::with_policy(MemoryStorage::new(), policy);

    let vault = m.create(PASSWORD, VaultContent::default()).unwrap();
    assert_eq!(vault.header().kdf_algorithm(), KdfAlgorithm::Pbkdf2);

    // Unlock uses the stored PBKDF2 params.
    unlocked(&m, PASSWORD);
}

#[test]
fn unusable_argon2_cost_fails_when_pinned() {
    let mut policy = cheap_policy(Some(KdfAlgorithm::Argon2id));
    policy.argon2.memory_kib = 1024;
    let m = VaultManager::with_policy(MemoryStorage::new(), policy);

    let err = m.create(PASSWORD, VaultContent::default()).unwrap_err();
    assert!(matches!(err, VaultError::KeyDerivationFailed(_)));
    assert_eq!(m.state().unwrap(), VaultState::Uninitialized);
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

#[test]
fn corrupted_ciphertext_reads_as_invalid_password() {
    let m = manager(Some(KdfAlgorithm::Pbkdf2));
    m.create(PASSWORD, VaultContent::default()).unwrap();

    let mut bytes = m.storage().snapshot().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    let tampered = VaultManager::new(MemoryStorage::with_bytes(bytes));
    assert!(matches!(
        tampered.unlock(PASSWORD),
        Err(VaultError::InvalidPassword)
    ));
}

/// Frame an arbitrary header around a real ciphertext.
fn vault_bytes_with_params(kdf_params: KdfParams) -> Vec<u8> {
    let sealed = encrypt(&[0x42u8; 32], br#"{"entries":[]}"#).unwrap();
    let header = VaultHeader {
        kdf_params,
        iv: sealed.nonce,
    };
    format::encode(&header, &sealed.ciphertext).unwrap()
}

#[test]
fn oversized_kdf_params_in_header_read_as_invalid_password() {
    for kdf_params in [
        KdfParams::Argon2id(Argon2idParams {
            memory_kib: u32::MAX,
            time_cost: 1,
            parallelism: 1,
            salt: vec![0u8; 16],
        }),
        KdfParams::Pbkdf2(Pbkdf2Params {
            iterations: u32::MAX,
            salt: vec![0u8; 16],
        }),
    ] {
        let bytes = vault_bytes_with_params(kdf_params);
        let m = VaultManager::new(MemoryStorage::with_bytes(bytes));
        assert!(matches!(m.unlock(PASSWORD), Err(VaultError::InvalidPassword)));
    }
}

#[test]
fn unlock_never_falls_back_to_another_kdf() {
    // A PBKDF2 vault whose header is rewritten to unusable Argon2id params
    // with the same salt.  Unlock must not retry with PBKDF2.
    let m = manager(Some(KdfAlgorithm::Pbkdf2));
    m.create(PASSWORD, VaultContent::default()).unwrap();
    let bytes = m.storage().snapshot().unwrap();
    let (header, ciphertext) = format::decode(&bytes).unwrap();

    let downgraded = VaultHeader {
        kdf_params: KdfParams::Argon2id(Argon2idParams {
            memory_kib: 1_024,
            time_cost: 1,
            parallelism: 1,
            salt: header.kdf_params.salt().to_vec(),
        }),
        iv: header.iv,
    };
    let rewritten = format::encode(&downgraded, ciphertext).unwrap();

    let tampered = VaultManager::new(MemoryStorage::with_bytes(rewritten));
    assert!(matches!(
        tampered.unlock(PASSWORD),
        Err(VaultError::InvalidPassword)
    ));
}

/// Storage whose reads always fail.
struct BrokenStorage;

impl VaultStorage for BrokenStorage {
    fn exists(&self) -> Result<bool> {
        Ok(true)
    }

    fn read(&self) -> Result<Option<Vec<u8>>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read denied").into())
    }

    fn write(&self, _bytes: &[u8]) -> Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "write denied").into())
    }

    fn describe(&self) -> String {
        "<broken>".to_string()
    }
}

#[test]
fn storage_errors_on_unlock_are_not_reported_as_bad_password() {
    let m = VaultManager::new(BrokenStorage);
    match m.unlock(PASSWORD) {
        Err(VaultError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
        other => panic!("expected an IO error, got {other:?}"),
    }
}

#[test]
fn garbage_file_reads_as_invalid_password() {
    let m = VaultManager::new(MemoryStorage::with_bytes(b"\x00\x04XXXXjunk".to_vec()));
    assert_eq!(m.state().unwrap(), VaultState::Locked);
    assert!(matches!(m.unlock(PASSWORD), Err(VaultError::InvalidPassword)));
    assert!(matches!(
        m.read_header(),
        Err(VaultError::InvalidVaultFormat(_))
    ));
}

// ---------------------------------------------------------------------------
// File storage
// ---------------------------------------------------------------------------

#[test]
fn file_vault_roundtrip_and_header_inspection() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("vault.bin");
    let m = VaultManager::with_policy(
        FileStorage::new(&path),
        cheap_policy(Some(KdfAlgorithm::Argon2id)),
    );

    let mut vault = m.create(PASSWORD, VaultContent::default()).unwrap();
    vault.add_entry(bank_entry());
    vault.save(&m).unwrap();
    vault.lock();

    assert!(path.is_file());

    // The header is readable without a password.
    let raw = fs::read(&path).unwrap();
    let header = format::decode_header(&raw).unwrap();
    match header.kdf_params {
        KdfParams::Argon2id(p) => {
            assert_eq!(p.memory_kib, MIN_MEMORY_KIB);
            assert_eq!(p.salt.len(), 16);
        }
        KdfParams::Pbkdf2(_) => panic!("expected Argon2id params"),
    }

    // The payload is not plaintext.
    assert!(!String::from_utf8_lossy(&raw).contains("alice"));

    // A fresh manager with a different policy still unlocks it.
    let other = VaultManager::new(FileStorage::new(&path));
    let vault = unlocked(&other, PASSWORD);
    assert_eq!(vault.entries()[0].username, "alice");
}
