//! Persisted ledger store.

use crate::error::Result;
use crate::persist::{Persisted, StoragePort};
use crate::types::LedgerEntry;
use std::sync::Arc;
use tracing::{debug, warn};

use super::state::{apply_action, LedgerAction, LedgerState};

/// Ledger store configuration.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Storage key the ledger lives under.
    pub storage_key: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            storage_key: "transaction-storage".to_string(),
        }
    }
}

/// Local ledger of user-entered transactions.
///
/// Loaded on open; every mutation is written through before it becomes
/// visible. Reloading restores the same ordered sequence.
pub struct LedgerStore {
    persisted: Persisted<LedgerState>,
}

impl LedgerStore {
    pub fn open(config: LedgerConfig, storage: Arc<dyn StoragePort>) -> Result<Self> {
        let persisted: Persisted<LedgerState> = Persisted::open(storage, config.storage_key)?;
        debug!(
            key = persisted.key(),
            entries = persisted.read(|s| s.transactions.len()),
            "ledger loaded"
        );
        Ok(Self { persisted })
    }

    /// Replace every entry.
    pub fn set(&self, entries: Vec<LedgerEntry>) -> Result<()> {
        self.dispatch(LedgerAction::Set(entries))
    }

    pub fn add(&self, entry: LedgerEntry) -> Result<()> {
        self.dispatch(LedgerAction::Add(entry))
    }

    /// Remove the entry at `index`. Fails with `IndexOutOfRange`, leaving the ledger as is.
    pub fn remove_at(&self, index: usize) -> Result<()> {
        self.dispatch(LedgerAction::RemoveAt(index))
    }

    pub fn clear(&self) -> Result<()> {
        self.dispatch(LedgerAction::Clear)
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.persisted.read(|s| s.transactions.clone())
    }

    pub fn len(&self) -> usize {
        self.persisted.read(|s| s.transactions.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dispatch(&self, action: LedgerAction) -> Result<()> {
        let result = self.persisted.update(|state| {
            *state = apply_action(state, action)?;
            Ok(state.transactions.len())
        });

        match result {
            Ok(len) => {
                debug!(entries = len, "ledger persisted");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "ledger update rejected");
                Err(e)
            }
        }
    }
}
