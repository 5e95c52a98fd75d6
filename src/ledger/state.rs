//! Ledger state and its reducer.

use crate::error::{EngineError, Result};
use crate::persist::PersistentState;
use crate::types::LedgerEntry;
use serde::{Deserialize, Serialize};

/// Ordered ledger entries as persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(default)]
    pub transactions: Vec<LedgerEntry>,
}

impl PersistentState for LedgerState {
    const VERSION: u32 = 1;
}

/// A mutation of the ledger.
#[derive(Clone, Debug, PartialEq)]
pub enum LedgerAction {
    /// Replace the whole sequence.
    Set(Vec<LedgerEntry>),
    /// Append at the end.
    Add(LedgerEntry),
    RemoveAt(usize),
    Clear,
}

/// Apply an action. On error the state is returned untouched.
///
/// Non-finite amounts are rejected: JSON has no encoding for them.
pub fn apply_action(state: &LedgerState, action: LedgerAction) -> Result<LedgerState> {
    let mut transactions = state.transactions.clone();

    match action {
        LedgerAction::Set(entries) => {
            entries.iter().try_for_each(check_amount)?;
            transactions = entries;
        }

        LedgerAction::Add(entry) => {
            check_amount(&entry)?;
            transactions.push(entry);
        }

        LedgerAction::RemoveAt(index) => {
            if index >= transactions.len() {
                return Err(EngineError::IndexOutOfRange {
                    index,
                    len: transactions.len(),
                });
            }
            transactions.remove(index);
        }

        LedgerAction::Clear => transactions.clear(),
    }

    Ok(LedgerState { transactions })
}

fn check_amount(entry: &LedgerEntry) -> Result<()> {
    if entry.amount.is_finite() {
        Ok(())
    } else {
        Err(EngineError::NonFiniteAmount(entry.amount))
    }
}
