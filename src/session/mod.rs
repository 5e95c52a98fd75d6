//! Subscription state store.
//!
//! Holds the viewer's identity claims, derived permissions and subscription
//! snapshot. Lifecycle: `Uninitialized -> Active (replaced any number of
//! times) -> Cleared` on sign-out.

mod store;
mod types;

pub use store::SessionStore;
pub use types::{
    AccountService, CreatorProfile, CreatorSubscription, IdentityEvent, Permissions,
    PlatformSubscription, SessionObserver, SessionPhase, SessionState, SubscriptionStatus,
    UserPermissions, ACTIVE_STATUS,
};
