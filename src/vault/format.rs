//! Binary vault file format.
//!
//! A vault file has this layout:
//!
//! ```text
//! [header_len: 2 bytes BE][header JSON: header_len bytes][ciphertext]
//! ```
//!
//! - **Header length**: big-endian u16 telling us where the header JSON
//!   ends and the ciphertext begins.
//! - **Header JSON**: serialized `VaultHeader` (magic, KDF, cipher, IV).
//!   Stored in plaintext; it carries everything needed to re-derive the
//!   key except the password.
//! - **Ciphertext**: AES-256-GCM output (tag included).  Opaque to this
//!   layer.
//!
//! The `magic` field inside the header is the only format-version
//! discriminator.  Anything else is rejected.

use serde::{Deserialize, Serialize};

use crate::crypto::encryption::NONCE_LEN;
use crate::crypto::kdf::{Argon2idParams, KdfAlgorithm, KdfParams, Pbkdf2Params};
use crate::errors::{Result, VaultError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic value identifying a version-1 vault file.
pub const MAGIC: &str = "PMV1";

/// The only supported cipher.
pub const CIPHER: &str = "AES-GCM";

/// Size of the big-endian header length prefix.
const PREFIX_LEN: usize = 2;

// ---------------------------------------------------------------------------
// VaultHeader
// ---------------------------------------------------------------------------

/// Metadata stored in plaintext at the beginning of a vault file.
///
/// The magic value and cipher name are fixed constants and are checked
/// while decoding, so they are not carried as fields here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultHeader {
    /// KDF algorithm and parameters (including the salt).
    pub kdf_params: KdfParams,

    /// Nonce of the ciphertext that follows this header.
    pub iv: [u8; NONCE_LEN],
}

impl VaultHeader {
    /// The KDF algorithm recorded in this header.
    pub fn kdf_algorithm(&self) -> KdfAlgorithm {
        self.kdf_params.algorithm()
    }

    /// A copy of this header pointing at a new ciphertext nonce.
    pub fn with_iv(&self, iv: [u8; NONCE_LEN]) -> Self {
        Self {
            kdf_params: self.kdf_params.clone(),
            iv,
        }
    }
}

/// The header exactly as it appears in JSON.
///
/// `kdf` is the discriminant for `kdfParams`; the params are parsed in a
/// second step so a mismatch becomes a format error instead of a guess.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireHeader {
    magic: String,
    kdf: KdfAlgorithm,
    kdf_params: serde_json::Value,
    cipher: String,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    iv: Vec<u8>,
}

impl WireHeader {
    fn from_header(header: &VaultHeader) -> Result<Self> {
        let kdf_params = match &header.kdf_params {
            KdfParams::Argon2id(p) => serde_json::to_value(p),
            KdfParams::Pbkdf2(p) => serde_json::to_value(p),
        }
        .map_err(|e| VaultError::SerializationError(format!("kdf params: {e}")))?;

        Ok(Self {
            magic: MAGIC.to_string(),
            kdf: header.kdf_algorithm(),
            kdf_params,
            cipher: CIPHER.to_string(),
            iv: header.iv.to_vec(),
        })
    }

    fn into_header(self) -> Result<VaultHeader> {
        if self.magic != MAGIC {
            return Err(VaultError::InvalidVaultFormat(format!(
                "unrecognized magic '{}', expected '{MAGIC}'",
                self.magic
            )));
        }

        if self.cipher != CIPHER {
            return Err(VaultError::InvalidVaultFormat(format!(
                "unsupported cipher '{}'",
                self.cipher
            )));
        }

        let kdf_params = match self.kdf {
            KdfAlgorithm::Argon2id => serde_json::from_value::<Argon2idParams>(self.kdf_params)
                .map(KdfParams::Argon2id),
            KdfAlgorithm::Pbkdf2 => serde_json::from_value::<Pbkdf2Params>(self.kdf_params)
                .map(KdfParams::Pbkdf2),
        }
        .map_err(|e| {
            VaultError::InvalidVaultFormat(format!("kdfParams do not match '{}': {e}", self.kdf))
        })?;

        let iv: [u8; NONCE_LEN] = self.iv.as_slice().try_into().map_err(|_| {
            VaultError::InvalidVaultFormat(format!(
                "iv must be {NONCE_LEN} bytes, got {}",
                self.iv.len()
            ))
        })?;

        Ok(VaultHeader { kdf_params, iv })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the on-disk bytes for a header and its ciphertext.
pub fn encode(header: &VaultHeader, ciphertext: &[u8]) -> Result<Vec<u8>> {
    let header_bytes = serde_json::to_vec(&WireHeader::from_header(header)?)
        .map_err(|e| VaultError::SerializationError(format!("header: {e}")))?;

    let header_len = u16::try_from(header_bytes.len()).map_err(|_| {
        VaultError::SerializationError(format!(
            "header length {} exceeds u16::MAX",
            header_bytes.len()
        ))
    })?;

    let mut buf = Vec::with_capacity(PREFIX_LEN + header_bytes.len() + ciphertext.len());
    buf.extend_from_slice(&header_len.to_be_bytes()); // 2 bytes BE
    buf.extend_from_slice(&header_bytes); // header JSON
    buf.extend_from_slice(ciphertext); // opaque ciphertext

    Ok(buf)
}

/// Split vault bytes into the parsed header and the raw ciphertext.
pub fn decode(data: &[u8]) -> Result<(VaultHeader, &[u8])> {
    let (header_bytes, ciphertext) = split(data)?;

    let wire: WireHeader = serde_json::from_slice(header_bytes)
        .map_err(|e| VaultError::InvalidVaultFormat(format!("header JSON: {e}")))?;

    Ok((wire.into_header()?, ciphertext))
}

/// Parse only the header (e.g. to show which KDF a locked vault uses).
pub fn decode_header(data: &[u8]) -> Result<VaultHeader> {
    decode(data).map(|(header, _)| header)
}

fn split(data: &[u8]) -> Result<(&[u8], &[u8])> {
    if data.len() < PREFIX_LEN {
        return Err(VaultError::InvalidVaultFormat(
            "file too small to be a valid vault".into(),
        ));
    }

    let header_len = usize::from(u16::from_be_bytes([data[0], data[1]]));
    let rest = &data[PREFIX_LEN..];

    if header_len > rest.len() {
        return Err(VaultError::InvalidVaultFormat(format!(
            "header length {header_len} exceeds remaining {} bytes",
            rest.len()
        )));
    }

    Ok(rest.split_at(header_len))
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
