//! Versioned, whole-value persistence of a store's state.

use crate::error::{EngineError, Result};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::storage::StoragePort;

/// State that can be persisted through [`Persisted`].
pub trait PersistentState:
    Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Version written with every save.
    const VERSION: u32;

    /// Upgrade a state written by an older version.
    ///
    /// The default decodes the old value as the current shape, relying on
    /// serde defaults for fields added since.
    fn migrate(state: serde_json::Value, from_version: u32) -> Result<Self> {
        debug!(from_version, to_version = Self::VERSION, "migrating persisted state");
        serde_json::from_value(state).map_err(|e| EngineError::Deserialization(e.to_string()))
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, S> {
    state: &'a S,
    version: u32,
}

#[derive(Deserialize)]
struct RawEnvelope {
    state: serde_json::Value,
    #[serde(default)]
    version: u32,
}

/// Encode a state as `{"state": …, "version": N}`.
pub fn encode_state<S: PersistentState>(state: &S) -> Result<Vec<u8>> {
    let envelope = EnvelopeRef {
        state,
        version: S::VERSION,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Decode an envelope, migrating older versions.
///
/// Returns the state and the version it was stored with.
pub fn decode_state<S: PersistentState>(bytes: &[u8]) -> Result<(S, u32)> {
    let raw: RawEnvelope = serde_json::from_slice(bytes)
        .map_err(|e| EngineError::Deserialization(e.to_string()))?;

    if raw.version > S::VERSION {
        return Err(EngineError::UnsupportedVersion {
            found: raw.version,
            supported: S::VERSION,
        });
    }

    let state = if raw.version == S::VERSION {
        serde_json::from_value(raw.state)
            .map_err(|e| EngineError::Deserialization(e.to_string()))?
    } else {
        S::migrate(raw.state, raw.version)?
    };

    Ok((state, raw.version))
}

/// A state value mirrored to storage under a fixed key.
///
/// Loaded once on open. Each mutation runs on a copy, the copy is written
/// whole, and only a successful write makes it visible. A failed write
/// leaves both memory and storage at the previous value.
pub struct Persisted<S: PersistentState> {
    key: String,
    storage: Arc<dyn StoragePort>,
    state: RwLock<S>,

    /// Serializes mutations and their writes.
    write_lock: Mutex<()>,
}

impl<S: PersistentState> Persisted<S> {
    /// Load the value under `key`, or start from the default.
    ///
    /// A value from an older version is migrated and written back.
    pub fn open(storage: Arc<dyn StoragePort>, key: impl Into<String>) -> Result<Self> {
        let key = key.into();

        let state = match storage.read(&key)? {
            None => {
                debug!(key = %key, "no persisted state, starting empty");
                S::default()
            }
            Some(bytes) => {
                let (state, version) = decode_state::<S>(&bytes)?;
                if version < S::VERSION {
                    storage.write(&key, &encode_state(&state)?)?;
                    info!(
                        key = %key,
                        from_version = version,
                        to_version = S::VERSION,
                        "persisted state migrated"
                    );
                }
                state
            }
        };

        Ok(Self {
            key,
            storage,
            state: RwLock::new(state),
            write_lock: Mutex::new(()),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Clone of the current state.
    pub fn get(&self) -> S {
        self.state.read().clone()
    }

    /// Read the current state in place.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.read())
    }

    /// Mutate, persist, then publish.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> Result<R>) -> Result<R> {
        let _lock = self.write_lock.lock();

        let mut next = self.state.read().clone();
        let out = f(&mut next)?;

        let bytes = encode_state(&next)?;
        self.storage.write(&self.key, &bytes)?;
        *self.state.write() = next;

        debug!(key = %self.key, bytes = bytes.len(), "state persisted");
        Ok(out)
    }
}
