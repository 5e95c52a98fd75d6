//! # Feedgate
//!
//! Client-side entitlement and feed-state reconciliation for a
//! subscription-tiered social feed.
//!
//! ## Core Concepts
//!
//! - **Entitlement**: a pure, fail-closed access decision per item from its
//!   tier gates, the server's access flag and the viewer's subscriptions
//! - **Session**: a single-writer store of identity claims, derived
//!   permissions and the subscription snapshot, replaced wholesale
//! - **Feed**: cursor pagination merged into one de-duplicated,
//!   insertion-ordered list, re-stamped whenever the session changes
//! - **Ledger**: a small persisted list of user-entered transactions
//!
//! ## Example
//!
//! ```ignore
//! use feedgate::{FeedConfig, FeedEngine, SessionStore, SubscriptionSnapshot, SubscriptionTier};
//!
//! let session = SessionStore::new();
//! let feed = FeedEngine::new(FeedConfig::default(), &session);
//!
//! // Pull the first page from the content service
//! feed.load_next_page(&content_service)?;
//!
//! // An upgrade re-stamps loaded items without a fetch
//! session.set_subscriptions(Some(SubscriptionSnapshot::platform(SubscriptionTier::Premium)));
//!
//! // Sign-out resets the feed before `clear_auth` returns
//! session.clear_auth();
//! ```

pub mod entitlement;
pub mod error;
pub mod events;
pub mod feed;
pub mod ledger;
pub mod persist;
pub mod session;
pub mod types;

// Re-exports
pub use entitlement::{
    derive_access, effective_access, view, AccessDecision, ItemView, LockReason,
    SubscriptionSnapshot, SubscriptionTier, Teaser,
};
pub use error::{EngineError, FetchError, Result};
pub use events::{
    BusEvent, DropReason, EventBus, EventConfig, EventHandle, FeedEvent, ListenerId, SessionEvent,
};
pub use feed::{
    FeedConfig, FeedEngine, FeedRequest, FeedSource, FetchTicket, MergeOutcome, MergedFeed,
    StampedItem,
};
pub use ledger::{apply_action, LedgerAction, LedgerConfig, LedgerState, LedgerStore};
pub use persist::{
    decode_state, encode_state, FileStorage, FileStorageConfig, MemoryStorage, PersistentState,
    Persisted, StoragePort,
};
pub use session::{
    AccountService, CreatorProfile, CreatorSubscription, IdentityEvent, Permissions,
    PlatformSubscription, SessionObserver, SessionPhase, SessionState, SessionStore,
    SubscriptionStatus, UserPermissions, ACTIVE_STATUS,
};
pub use types::*;
