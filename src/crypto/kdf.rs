//! Password-based key derivation: Argon2id or PBKDF2-HMAC-SHA256.
//!
//! A vault records which algorithm (and which cost parameters) produced
//! its key in the plaintext header, so re-opening always re-runs exactly
//! the same derivation.  Argon2id is the default for new vaults; PBKDF2
//! is kept for vaults created where Argon2id could not run.
//!
//! The Argon2id -> PBKDF2 fallback exists only in
//! [`derive_for_new_vault`].  [`derive_key`] never substitutes one
//! algorithm for another.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use super::keys::{MasterKey, KEY_LEN};
use crate::errors::{Result, VaultError};
use crate::vault::format::{base64_decode, base64_encode};

/// Length of a freshly generated salt in bytes (128 bits).
pub const SALT_LEN: usize = 16;

/// Minimum safe Argon2id memory cost in KiB (8 MB).
pub const MIN_MEMORY_KIB: u32 = 8_192;

/// Minimum PBKDF2 iteration count accepted for any vault.
pub const MIN_PBKDF2_ITERATIONS: u32 = 10_000;

/// Largest Argon2id memory cost accepted from a header or config (1 GiB).
pub const MAX_MEMORY_KIB: u32 = 1_048_576;

/// Largest Argon2id pass count accepted.
pub const MAX_TIME_COST: u32 = 64;

/// Largest Argon2id lane count accepted.
pub const MAX_PARALLELISM: u32 = 64;

/// Largest PBKDF2 iteration count accepted.
pub const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

/// Default Argon2id memory cost in KiB (64 MB).
pub const DEFAULT_ARGON2_MEMORY_KIB: u32 = 65_536;

/// Default Argon2id pass count.
pub const DEFAULT_ARGON2_TIME_COST: u32 = 3;

/// Default Argon2id lane count.
pub const DEFAULT_ARGON2_PARALLELISM: u32 = 1;

/// Default PBKDF2 iteration count for new vaults.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 310_000;

/// The two supported key derivation algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KdfAlgorithm {
    Argon2id,
    Pbkdf2,
}

impl fmt::Display for KdfAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Argon2id => f.write_str("argon2id"),
            Self::Pbkdf2 => f.write_str("pbkdf2"),
        }
    }
}

/// Argon2id parameters as stored in a vault header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Argon2idParams {
    /// Memory cost in KiB.
    #[serde(rename = "mem")]
    pub memory_kib: u32,
    /// Number of passes.
    #[serde(rename = "time")]
    pub time_cost: u32,
    /// Parallelism lanes.
    pub parallelism: u32,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,
}

/// PBKDF2-HMAC-SHA256 parameters as stored in a vault header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pbkdf2Params {
    pub iterations: u32,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,
}

/// The parameters of exactly one KDF algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KdfParams {
    Argon2id(Argon2idParams),
    Pbkdf2(Pbkdf2Params),
}

impl KdfParams {
    /// The algorithm these parameters belong to.
    pub fn algorithm(&self) -> KdfAlgorithm {
        match self {
            Self::Argon2id(_) => KdfAlgorithm::Argon2id,
            Self::Pbkdf2(_) => KdfAlgorithm::Pbkdf2,
        }
    }

    /// The per-vault salt.
    pub fn salt(&self) -> &[u8] {
        match self {
            Self::Argon2id(p) => &p.salt,
            Self::Pbkdf2(p) => &p.salt,
        }
    }
}

/// Argon2id cost settings without a salt (used for new vaults).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Cost {
    pub memory_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for Argon2Cost {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_ARGON2_MEMORY_KIB,
            time_cost: DEFAULT_ARGON2_TIME_COST,
            parallelism: DEFAULT_ARGON2_PARALLELISM,
        }
    }
}

impl Argon2Cost {
    /// Attach a salt, producing storable header parameters.
    pub fn with_salt(self, salt: Vec<u8>) -> KdfParams {
        KdfParams::Argon2id(Argon2idParams {
            memory_kib: self.memory_kib,
            time_cost: self.time_cost,
            parallelism: self.parallelism,
            salt,
        })
    }
}

/// How new vaults choose their KDF.
///
/// These values only ever apply to vault creation; an existing vault
/// keeps whatever its header recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfPolicy {
    /// `None` means "Argon2id, falling back to PBKDF2 if it fails".
    pub pinned: Option<KdfAlgorithm>,
    pub argon2: Argon2Cost,
    pub pbkdf2_iterations: u32,
}

impl Default for KdfPolicy {
    fn default() -> Self {
        Self {
            pinned: None,
            argon2: Argon2Cost::default(),
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

impl KdfPolicy {
    fn pbkdf2_params(&self) -> KdfParams {
        KdfParams::Pbkdf2(Pbkdf2Params {
            iterations: self.pbkdf2_iterations,
            salt: generate_salt().to_vec(),
        })
    }
}

/// Derive a 32-byte key from `password` using exactly `params`.
///
/// The same password + params always produce the same key.
/// Enforces minimum parameters to refuse dangerously weak settings, and
/// maximums so a hostile header cannot exhaust memory or CPU.
pub fn derive_key(password: &[u8], params: &KdfParams) -> Result<MasterKey> {
    if params.salt().len() < SALT_LEN {
        return Err(VaultError::KeyDerivationFailed(format!(
            "salt must be at least {SALT_LEN} bytes (got {})",
            params.salt().len()
        )));
    }

    match params {
        KdfParams::Argon2id(p) => derive_argon2id(password, p),
        KdfParams::Pbkdf2(p) => derive_pbkdf2(password, p),
    }
}

fn derive_argon2id(password: &[u8], p: &Argon2idParams) -> Result<MasterKey> {
    if p.memory_kib < MIN_MEMORY_KIB {
        return Err(VaultError::KeyDerivationFailed(format!(
            "Argon2 memory cost must be at least {MIN_MEMORY_KIB} KiB (got {})",
            p.memory_kib
        )));
    }
    if p.memory_kib > MAX_MEMORY_KIB {
        return Err(VaultError::KeyDerivationFailed(format!(
            "Argon2 memory cost must be at most {MAX_MEMORY_KIB} KiB (got {})",
            p.memory_kib
        )));
    }
    if !(1..=MAX_TIME_COST).contains(&p.time_cost) {
        return Err(VaultError::KeyDerivationFailed(format!(
            "Argon2 time cost must be between 1 and {MAX_TIME_COST} (got {})",
            p.time_cost
        )));
    }
    if !(1..=MAX_PARALLELISM).contains(&p.parallelism) {
        return Err(VaultError::KeyDerivationFailed(format!(
            "Argon2 parallelism must be between 1 and {MAX_PARALLELISM} (got {})",
            p.parallelism
        )));
    }

    let params = Params::new(p.memory_kib, p.time_cost, p.parallelism, Some(KEY_LEN))
        .map_err(|e| VaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(password, &p.salt, &mut key)
        .map_err(|e| VaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    let master = MasterKey::new(key);
    key.zeroize();
    Ok(master)
}

fn derive_pbkdf2(password: &[u8], p: &Pbkdf2Params) -> Result<MasterKey> {
    if p.iterations < MIN_PBKDF2_ITERATIONS {
        return Err(VaultError::KeyDerivationFailed(format!(
            "PBKDF2 iterations must be at least {MIN_PBKDF2_ITERATIONS} (got {})",
            p.iterations
        )));
    }
    if p.iterations > MAX_PBKDF2_ITERATIONS {
        return Err(VaultError::KeyDerivationFailed(format!(
            "PBKDF2 iterations must be at most {MAX_PBKDF2_ITERATIONS} (got {})",
            p.iterations
        )));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, &p.salt, p.iterations, &mut key);
    let master = MasterKey::new(key);
    key.zeroize();
    Ok(master)
}

/// Pick KDF parameters for a brand-new vault and derive its key.
///
/// Without a pinned algorithm this tries Argon2id first; if that
/// derivation fails it logs a warning and falls back to PBKDF2 with a
/// fresh salt.  A pinned algorithm is used as-is and its failure is
/// returned to the caller.
pub fn derive_for_new_vault(
    password: &[u8],
    policy: &KdfPolicy,
) -> Result<(KdfParams, MasterKey)> {
    let params = match policy.pinned {
        Some(KdfAlgorithm::Pbkdf2) => policy.pbkdf2_params(),
        Some(KdfAlgorithm::Argon2id) | None => policy.argon2.with_salt(generate_salt().to_vec()),
    };

    match derive_key(password, &params) {
        Ok(key) => Ok((params, key)),
        Err(e) if policy.pinned.is_none() => {
            tracing::warn!(error = %e, "Argon2id unavailable, falling back to PBKDF2 for new vault");
            let fallback = policy.pbkdf2_params();
            let key = derive_key(password, &fallback)?;
            Ok((fallback, key))
        }
        Err(e) => Err(e),
    }
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
