//! Entitlement model.
//!
//! Pure functions deciding how much of a content item a viewer may see:
//! - Tier ordering (`none < basic < premium < creator-exclusive`)
//! - Platform and creator gates
//! - Fail-closed combination with the server's `hasAccess` flag
//!
//! # Example
//!
//! ```ignore
//! let snapshot = SubscriptionSnapshot::platform(SubscriptionTier::Premium);
//! let decision = effective_access(&item, Some(&snapshot));
//! match view(&item, &decision) {
//!     ItemView::Full(item) => render_body(item),
//!     ItemView::Teaser(teaser) => render_upsell(teaser),
//!     ItemView::Withheld(id) => render_placeholder(id),
//! }
//! ```

mod access;
mod tier;

pub use access::{derive_access, effective_access, view, AccessDecision, ItemView, LockReason, Teaser};
pub use tier::{SubscriptionSnapshot, SubscriptionTier};
