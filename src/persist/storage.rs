//! Storage backends for persisted stores.

use crate::error::{EngineError, Result};
use fs2::FileExt;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Magic bytes for value files.
const VALUE_MAGIC: &[u8; 4] = b"FGV\0";

/// Current value file format version.
const VALUE_VERSION: u8 = 1;

/// Magic + version + length.
const HEADER_LEN: usize = 4 + 1 + 8;

/// Trailing CRC32.
const CHECKSUM_LEN: usize = 4;

/// Namespaced key-value blob storage.
///
/// A write replaces the whole value for a key; readers see either the old
/// value or the new one, never a mix.
pub trait StoragePort: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn write(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Returns whether a value was present.
    fn remove(&self, key: &str) -> Result<bool>;
}

/// In-process storage. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().contains_key(key)
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.values.lock().remove(key).is_some())
    }
}

/// File storage configuration.
#[derive(Clone, Debug)]
pub struct FileStorageConfig {
    /// Directory holding one file per key.
    pub path: PathBuf,

    /// Create the directory if missing.
    pub create_if_missing: bool,
}

impl FileStorageConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            create_if_missing: true,
        }
    }
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self::new("feedgate-data")
    }
}

/// Durable storage: one framed file per key in a locked directory.
///
/// File layout:
/// ```text
/// magic (4) | version (1) | length (8, LE) | body | crc32 of body (4, LE)
/// ```
/// Writes go to a temp file that is synced and then renamed over the old one.
pub struct FileStorage {
    path: PathBuf,

    /// Held for the lifetime of the storage.
    _lock_file: File,
}

impl FileStorage {
    /// Open storage at the configured directory.
    ///
    /// Fails with `Locked` if another handle holds the directory.
    pub fn open(config: FileStorageConfig) -> Result<Self> {
        let path = config.path;

        if !path.exists() {
            if config.create_if_missing {
                fs::create_dir_all(&path)?;
            } else {
                return Err(EngineError::NotInitialized);
            }
        }

        let lock_file = Self::acquire_lock(&path)?;
        debug!(path = %path.display(), "file storage opened");

        Ok(Self {
            path,
            _lock_file: lock_file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn value_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.path.join(format!("{}.val", hex::encode(digest)))
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(path.join("LOCK"))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| EngineError::Locked)?;

        Ok(lock_file)
    }
}

impl StoragePort for FileStorage {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value_path = self.value_path(key);
        if !value_path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&value_path)?;
        decode_frame(&bytes).map(Some)
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        let value_path = self.value_path(key);
        let temp_path = value_path.with_extension("tmp");

        let mut file = File::create(&temp_path)?;
        file.write_all(&encode_frame(value))?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &value_path)?;

        debug!(key, bytes = value.len(), "value written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let value_path = self.value_path(key);
        if value_path.exists() {
            fs::remove_file(&value_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

fn encode_frame(body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LEN + body.len() + CHECKSUM_LEN);
    frame.extend_from_slice(VALUE_MAGIC);
    frame.push(VALUE_VERSION);
    frame.extend_from_slice(&(body.len() as u64).to_le_bytes());
    frame.extend_from_slice(body);
    frame.extend_from_slice(&crc32fast::hash(body).to_le_bytes());
    frame
}

fn decode_frame(frame: &[u8]) -> Result<Vec<u8>> {
    if frame.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(EngineError::InvalidFormat("Value file truncated".into()));
    }

    if &frame[..4] != VALUE_MAGIC {
        return Err(EngineError::InvalidFormat("Invalid value magic".into()));
    }

    if frame[4] != VALUE_VERSION {
        return Err(EngineError::InvalidFormat(format!(
            "Unsupported value file version: {}",
            frame[4]
        )));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&frame[5..HEADER_LEN]);
    let declared = u64::from_le_bytes(len_bytes);

    let len = usize::try_from(declared)
        .ok()
        .filter(|len| {
            len.checked_add(HEADER_LEN + CHECKSUM_LEN)
                .map_or(false, |total| total == frame.len())
        })
        .ok_or_else(|| {
            EngineError::InvalidFormat(format!(
                "Value length {} does not match file size {}",
                declared,
                frame.len()
            ))
        })?;

    let body = &frame[HEADER_LEN..HEADER_LEN + len];

    let mut checksum_bytes = [0u8; 4];
    checksum_bytes.copy_from_slice(&frame[HEADER_LEN + len..]);
    let stored = u32::from_le_bytes(checksum_bytes);
    let computed = crc32fast::hash(body);

    if stored != computed {
        return Err(EngineError::ChecksumMismatch {
            expected: stored,
            got: computed,
        });
    }

    Ok(body.to_vec())
}
