//! Local ledger store.
//!
//! A flat, ordered list of user-entered transactions persisted under one
//! storage key. Mutations go through a pure reducer; persistence is the
//! [`Persisted`](crate::persist::Persisted) adapter's job.

mod state;
mod store;

pub use state::{apply_action, LedgerAction, LedgerState};
pub use store::{LedgerConfig, LedgerStore};
