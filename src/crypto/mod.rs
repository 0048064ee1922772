//! Cryptographic primitives for Passman.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - Argon2id / PBKDF2 password-based key derivation (`kdf`)
//! - The zeroizing key holder (`keys`)
//! - Random password generation (`generator`)
//! - Master password strength scoring (`strength`)

pub mod encryption;
pub mod generator;
pub mod kdf;
pub mod keys;
pub mod strength;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt, Sealed, NONCE_LEN};
pub use generator::{generate_password, DEFAULT_GENERATED_LEN};
pub use kdf::{
    derive_for_new_vault, derive_key, generate_salt, Argon2Cost, Argon2idParams, KdfAlgorithm,
    KdfParams, KdfPolicy, Pbkdf2Params,
};
pub use keys::MasterKey;
pub use strength::{check_password_strength, PasswordStrength};
