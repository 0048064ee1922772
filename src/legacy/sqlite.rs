//! SQLite-backed legacy store.
//!
//! Layout:
//!
//! ```text
//! metadata(key TEXT PRIMARY KEY, value TEXT)
//!   'masterKeySalt' -> base64 salt
//!   'verification'  -> {"iv": b64, "encryptedData": b64} of "VAULT_OK"
//! entries(id INTEGER PRIMARY KEY, title, username,
//!         encrypted_password {"iv", "encryptedData"} JSON, url, notes)
//! ```
//!
//! A `SqliteLegacyStore` is an explicit handle: open it once, pass it to
//! the migration, and the connection is closed when it is dropped or
//! destroyed.  Opening a path that does not exist never creates a file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use super::{
    EncryptedField, LegacyEntry, LegacyKey, LegacyRecord, LegacyStore, VERIFICATION_SENTINEL,
};
use crate::crypto::kdf::generate_salt;
use crate::errors::{Result, VaultError};

const SALT_KEY: &str = "masterKeySalt";
const VERIFICATION_KEY: &str = "verification";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS metadata (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS entries (
        id                 INTEGER PRIMARY KEY AUTOINCREMENT,
        title              TEXT NOT NULL,
        username           TEXT NOT NULL,
        encrypted_password TEXT NOT NULL,
        url                TEXT NOT NULL,
        notes              TEXT NOT NULL
    );";

/// Handle to a legacy store file.
pub struct SqliteLegacyStore {
    path: PathBuf,
    conn: Option<Connection>,
}

impl SqliteLegacyStore {
    /// Open the store at `path` if it exists.
    ///
    /// A missing file yields a handle whose `exists()` is `false`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = if path.is_file() {
            let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
                .map_err(db_err)?;
            Some(conn)
        } else {
            None
        };

        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Create a new legacy-format store protected by `password`.
    ///
    /// Returns the handle and the derived key, ready for `add_entry`.
    pub fn create(path: &Path, password: &str) -> Result<(Self, LegacyKey)> {
        if path.exists() {
            return Err(VaultError::LegacyStore(format!(
                "legacy store already exists at {}",
                path.display()
            )));
        }

        let conn = Connection::open(path).map_err(db_err)?;
        conn.execute_batch(SCHEMA).map_err(db_err)?;

        let salt = generate_salt();
        let key = LegacyKey::derive(password, &salt)?;
        let verification = EncryptedField::seal(&key, VERIFICATION_SENTINEL)?;

        conn.execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)",
            params![SALT_KEY, BASE64.encode(salt)],
        )
        .map_err(db_err)?;
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)",
            params![VERIFICATION_KEY, to_json(&verification)?],
        )
        .map_err(db_err)?;

        Ok((
            Self {
                path: path.to_path_buf(),
                conn: Some(conn),
            },
            key,
        ))
    }

    /// Append a record, encrypting its password under `key`.
    ///
    /// Returns the new row id.
    pub fn add_entry(&self, key: &LegacyKey, entry: &LegacyEntry) -> Result<i64> {
        let conn = self.connection()?;
        let encrypted = EncryptedField::seal(key, &entry.password)?;

        conn.execute(
            "INSERT INTO entries (title, username, encrypted_password, url, notes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.title,
                entry.username,
                to_json(&encrypted)?,
                entry.url,
                entry.notes
            ],
        )
        .map_err(db_err)?;

        Ok(conn.last_insert_rowid())
    }

    /// Returns the path of the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connection(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| VaultError::LegacyStore("legacy store is not open".into()))
    }

    fn metadata(&self, key: &str) -> Result<Option<String>> {
        self.connection()?
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)
    }

    fn salt(&self) -> Result<Option<Vec<u8>>> {
        self.metadata(SALT_KEY)?
            .map(|b64| {
                BASE64
                    .decode(b64)
                    .map_err(|e| VaultError::LegacyStore(format!("bad salt encoding: {e}")))
            })
            .transpose()
    }

    fn records(&self) -> Result<Vec<LegacyRecord>> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, username, encrypted_password, url, notes
                 FROM entries ORDER BY id",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .map_err(db_err)?;

        let mut records = Vec::new();
        for row in rows {
            let (id, title, username, encrypted_json, url, notes) = row.map_err(db_err)?;
            let encrypted_password: EncryptedField =
                serde_json::from_str(&encrypted_json).map_err(|e| {
                    VaultError::LegacyStore(format!("entry {id}: bad password field: {e}"))
                })?;
            records.push(LegacyRecord {
                id,
                title,
                username,
                encrypted_password,
                url,
                notes,
            });
        }

        Ok(records)
    }
}

impl LegacyStore for SqliteLegacyStore {
    fn exists(&self) -> Result<bool> {
        if self.conn.is_none() {
            return Ok(false);
        }

        // Any file without a readable salt is not a legacy vault.
        match self.metadata(SALT_KEY) {
            Ok(salt) => Ok(salt.is_some()),
            Err(e) => {
                tracing::debug!(error = %e, path = %self.path.display(), "legacy store unreadable");
                Ok(false)
            }
        }
    }

    fn unlock(&self, password: &str) -> Result<Option<LegacyKey>> {
        let Some(salt) = self.salt()? else {
            return Ok(None);
        };
        let Some(verification_json) = self.metadata(VERIFICATION_KEY)? else {
            return Ok(None);
        };
        let verification: EncryptedField = serde_json::from_str(&verification_json)
            .map_err(|e| VaultError::LegacyStore(format!("bad verification blob: {e}")))?;

        let key = LegacyKey::derive(password, &salt)?;
        Ok(key.verifies(&verification).then_some(key))
    }

    fn list_all(&self, key: &LegacyKey) -> Result<Vec<LegacyEntry>> {
        self.records()?
            .into_iter()
            .map(|record| record.decrypt(key))
            .collect()
    }

    fn destroy(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            if let Err((conn, e)) = conn.close() {
                // Keep the handle usable if the connection refused to close.
                self.conn = Some(conn);
                return Err(db_err(e));
            }
        }

        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn db_err(e: rusqlite::Error) -> VaultError {
    VaultError::LegacyStore(e.to_string())
}

fn to_json(field: &EncryptedField) -> Result<String> {
    serde_json::to_string(field).map_err(|e| VaultError::SerializationError(e.to_string()))
}
