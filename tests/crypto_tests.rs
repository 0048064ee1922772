//! Integration tests for the Passman crypto module.

use passman::crypto::kdf::{MIN_MEMORY_KIB, MIN_PBKDF2_ITERATIONS};
use passman::crypto::{
    check_password_strength, decrypt, derive_for_new_vault, derive_key, encrypt, generate_salt,
    Argon2Cost, Argon2idParams, KdfAlgorithm, KdfParams, KdfPolicy, Pbkdf2Params, NONCE_LEN,
};
use passman::errors::VaultError;

fn cheap_argon2(salt: Vec<u8>) -> KdfParams {
    KdfParams::Argon2id(Argon2idParams {
        memory_kib: MIN_MEMORY_KIB,
        time_cost: 1,
        parallelism: 1,
        salt,
    })
}

fn cheap_pbkdf2(salt: Vec<u8>) -> KdfParams {
    KdfParams::Pbkdf2(Pbkdf2Params {
        iterations: MIN_PBKDF2_ITERATIONS,
        salt,
    })
}

// ---------------------------------------------------------------------------
// Encryption round-trip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = [0xABu8; 32];
    let plaintext = br#"{"entries":[{"title":"Bank"}]}"#;

    let sealed = encrypt(&key, plaintext).expect("encrypt should succeed");

    // Ciphertext carries the 16-byte GCM tag.
    assert_eq!(sealed.ciphertext.len(), plaintext.len() + 16);
    assert_eq!(sealed.nonce.len(), NONCE_LEN);

    let recovered = decrypt(&key, &sealed.nonce, &sealed.ciphertext).expect("decrypt");
    assert_eq!(recovered, plaintext);
}

#[test]
fn encrypt_uses_a_fresh_nonce_each_time() {
    let key = [0xCDu8; 32];
    let a = encrypt(&key, b"same").unwrap();
    let b = encrypt(&key, b"same").unwrap();

    assert_ne!(a.nonce, b.nonce);
    assert_ne!(a.ciphertext, b.ciphertext);
}

#[test]
fn decrypt_with_wrong_key_fails() {
    let sealed = encrypt(&[0x11u8; 32], b"secret").unwrap();
    let result = decrypt(&[0x22u8; 32], &sealed.nonce, &sealed.ciphertext);
    assert!(matches!(result, Err(VaultError::DecryptionFailed)));
}

#[test]
fn decrypt_detects_tampering() {
    let key = [0x33u8; 32];
    let mut sealed = encrypt(&key, b"secret").unwrap();
    sealed.ciphertext[0] ^= 0x01;

    assert!(decrypt(&key, &sealed.nonce, &sealed.ciphertext).is_err());
}

#[test]
fn decrypt_rejects_bad_nonce_length() {
    let key = [0x44u8; 32];
    let sealed = encrypt(&key, b"secret").unwrap();
    assert!(decrypt(&key, &sealed.nonce[..8], &sealed.ciphertext).is_err());
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn same_password_and_params_give_same_key() {
    let salt = generate_salt().to_vec();
    for params in [cheap_argon2(salt.clone()), cheap_pbkdf2(salt)] {
        let k1 = derive_key(b"correct horse", &params).unwrap();
        let k2 = derive_key(b"correct horse", &params).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }
}

#[test]
fn different_salts_give_different_keys() {
    let k1 = derive_key(b"pw", &cheap_pbkdf2(vec![1u8; 16])).unwrap();
    let k2 = derive_key(b"pw", &cheap_pbkdf2(vec![2u8; 16])).unwrap();
    assert_ne!(k1.as_bytes(), k2.as_bytes());
}

#[test]
fn short_salt_is_rejected() {
    let result = derive_key(b"pw", &cheap_argon2(vec![0u8; 8]));
    assert!(matches!(result, Err(VaultError::KeyDerivationFailed(_))));
}

#[test]
fn new_vault_derivation_matches_later_derivation() {
    let policy = KdfPolicy {
        pinned: None,
        argon2: Argon2Cost {
            memory_kib: MIN_MEMORY_KIB,
            time_cost: 1,
            parallelism: 1,
        },
        pbkdf2_iterations: MIN_PBKDF2_ITERATIONS,
    };

    let (params, key) = derive_for_new_vault(b"master", &policy).unwrap();
    assert_eq!(params.algorithm(), KdfAlgorithm::Argon2id);

    let again = derive_key(b"master", &params).unwrap();
    assert_eq!(key.as_bytes(), again.as_bytes());
}

// ---------------------------------------------------------------------------
// Password strength
// ---------------------------------------------------------------------------

#[test]
fn strength_table() {
    assert_eq!(check_password_strength("").score, 0);

    let short = check_password_strength("Ab1!");
    assert_eq!(short.message, "Too short (min 12 chars)");

    let strong = check_password_strength("Tr0ub4dor&3xtra!");
    assert_eq!(strong.score, 100);
    assert_eq!(strong.message, "Strong");

    let weak = check_password_strength("abcdefghijkl");
    assert_eq!(weak.score, 50);
    assert_eq!(weak.message, "Weak");
}
