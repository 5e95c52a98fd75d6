//! Access derivation for a single content item.

use super::tier::{SubscriptionSnapshot, SubscriptionTier};
use crate::types::{Author, ContentItem, PostId};
use serde::{Deserialize, Serialize};

/// Why an item is locked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LockReason {
    /// The viewer's tier does not meet a gate on the item.
    InsufficientTier {
        required: SubscriptionTier,
        held: SubscriptionTier,
    },
    /// Locally entitled, but the server has not granted access.
    ServerDenied,
}

/// Outcome of evaluating an item for a viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum AccessDecision {
    Full,
    Locked { reason: LockReason },
}

impl AccessDecision {
    pub fn is_full(&self) -> bool {
        matches!(self, AccessDecision::Full)
    }

    pub fn is_locked(&self) -> bool {
        !self.is_full()
    }

    /// Locked only because the server copy still says so.
    pub fn awaits_server(&self) -> bool {
        matches!(
            self,
            AccessDecision::Locked {
                reason: LockReason::ServerDenied
            }
        )
    }

    fn insufficient(required: SubscriptionTier, held: SubscriptionTier) -> Self {
        AccessDecision::Locked {
            reason: LockReason::InsufficientTier { required, held },
        }
    }
}

/// Evaluate the item's gates against a snapshot, ignoring the server flag.
///
/// The platform gate is checked against the platform tier. The creator gate
/// is checked against the better of the platform tier and the tier held for
/// `item.creator_id`. When both gates are set, both must pass.
pub fn derive_access(item: &ContentItem, snapshot: &SubscriptionSnapshot) -> AccessDecision {
    if let Some(required) = item.required_subscription_tier {
        if !snapshot.platform.satisfies(required) {
            return AccessDecision::insufficient(required, snapshot.platform);
        }
    }

    if let Some(required) = item.minimum_tier_required {
        let creator_tier = item
            .creator_id
            .as_ref()
            .and_then(|creator| snapshot.creator_tier(creator))
            .unwrap_or(SubscriptionTier::None);
        let held = snapshot.platform.max(creator_tier);
        if !held.satisfies(required) {
            return AccessDecision::insufficient(required, held);
        }
    }

    AccessDecision::Full
}

/// Combine local derivation with the server flag. Locked if either says locked.
///
/// A missing snapshot (signed out, not yet loaded) evaluates as tier `none`.
pub fn effective_access(
    item: &ContentItem,
    snapshot: Option<&SubscriptionSnapshot>,
) -> AccessDecision {
    let local = match snapshot {
        Some(snapshot) => derive_access(item, snapshot),
        None => derive_access(item, &SubscriptionSnapshot::none()),
    };

    match local {
        AccessDecision::Full if !item.has_access => AccessDecision::Locked {
            reason: LockReason::ServerDenied,
        },
        decision => decision,
    }
}

/// What a locked-but-gated item may still show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Teaser<'a> {
    pub id: &'a PostId,
    pub author: &'a Author,
    pub timestamp: &'a str,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    /// Strictest gate on the item.
    pub required: Option<SubscriptionTier>,
    pub reason: LockReason,
}

/// Degree of content to render for an item.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemView<'a> {
    /// Everything, body included.
    Full(&'a ContentItem),
    /// Author and engagement metadata; body and image withheld.
    Teaser(Teaser<'a>),
    /// Ungated item the server refused; nothing beyond the id.
    Withheld(&'a PostId),
}

/// Project an item through a decision.
pub fn view<'a>(item: &'a ContentItem, decision: &AccessDecision) -> ItemView<'a> {
    match decision {
        AccessDecision::Full => ItemView::Full(item),
        AccessDecision::Locked { .. } if !item.is_gated() => ItemView::Withheld(&item.id),
        AccessDecision::Locked { reason } => ItemView::Teaser(Teaser {
            id: &item.id,
            author: &item.author,
            timestamp: &item.timestamp,
            likes: item.likes,
            comments: item.comments,
            shares: item.shares,
            required: item
                .required_subscription_tier
                .max(item.minimum_tier_required),
            reason: *reason,
        }),
    }
}
