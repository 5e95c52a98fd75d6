//! Session state types and the wire shapes of the account services.

use crate::entitlement::{SubscriptionSnapshot, SubscriptionTier};
use crate::error::FetchError;
use crate::types::CreatorId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Status value the services use for a live subscription.
pub const ACTIVE_STATUS: &str = "active";

/// Creator profile as returned by the permissions endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorProfile {
    #[serde(default)]
    pub available_tiers: Vec<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub subscriber_count: u64,
    #[serde(default)]
    pub total_earnings: f64,
}

/// Identity claims from the permissions endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissions {
    #[serde(default)]
    pub is_creator: bool,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_profile: Option<CreatorProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_tier: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSubscription {
    #[serde(default)]
    pub id: String,
    pub status: String,
    #[serde(rename = "tierID", alias = "tierId")]
    pub tier_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorSubscription {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "creatorId")]
    pub creator_id: CreatorId,
    pub status: String,
    #[serde(rename = "tierID", alias = "tierId")]
    pub tier_id: String,
}

/// Body of the subscription status endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    #[serde(default)]
    pub platform_subscription: Option<PlatformSubscription>,
    #[serde(default)]
    pub creator_subscriptions: Vec<CreatorSubscription>,
}

impl SubscriptionStatus {
    /// Collapse the active subscriptions into a snapshot.
    pub fn snapshot(&self) -> SubscriptionSnapshot {
        let platform = self
            .platform_subscription
            .as_ref()
            .filter(|sub| sub.status == ACTIVE_STATUS)
            .map(|sub| SubscriptionTier::parse(&sub.tier_id))
            .unwrap_or_default();

        self.creator_subscriptions
            .iter()
            .filter(|sub| sub.status == ACTIVE_STATUS)
            .fold(SubscriptionSnapshot::platform(platform), |snapshot, sub| {
                snapshot.with_creator(sub.creator_id.as_str(), SubscriptionTier::parse(&sub.tier_id))
            })
    }
}

/// Capability flags. Derived, never set directly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub is_creator: bool,
    pub is_premium: bool,
    pub can_post: bool,
    pub can_comment: bool,
    /// Creator with at least one tier to gate posts behind.
    pub can_publish_premium: bool,
    /// Tiers a creator may gate posts with.
    pub publishable_tiers: Vec<SubscriptionTier>,
}

impl Permissions {
    /// Derive capabilities from identity claims and the current snapshot.
    pub fn derive(claims: &UserPermissions, snapshot: Option<&SubscriptionSnapshot>) -> Self {
        let platform = snapshot.map(|s| s.platform).unwrap_or_default();
        let claimed = claims
            .subscription_tier
            .as_deref()
            .map(SubscriptionTier::parse)
            .unwrap_or_default();

        let mut publishable_tiers: Vec<SubscriptionTier> = claims
            .creator_profile
            .iter()
            .flat_map(|profile| profile.available_tiers.iter())
            .map(|id| SubscriptionTier::parse(id))
            .filter(|tier| *tier > SubscriptionTier::None)
            .collect();
        publishable_tiers.sort();
        publishable_tiers.dedup();

        Self {
            is_creator: claims.is_creator,
            is_premium: claims.is_premium
                || claimed >= SubscriptionTier::Premium
                || platform >= SubscriptionTier::Premium,
            can_post: true,
            can_comment: true,
            can_publish_premium: claims.is_creator && !publishable_tiers.is_empty(),
            publishable_tiers,
        }
    }
}

/// Lifecycle of the session store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing loaded yet.
    #[default]
    Uninitialized,
    /// At least one value installed since start or the last sign-out.
    Active,
    /// Signed out; both fields null.
    Cleared,
}

/// One consistent revision of the session.
///
/// `permissions` is always derived from the `claims` and `subscriptions`
/// of the same revision.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub revision: u64,
    pub phase: SessionPhase,
    pub user_id: Option<String>,
    pub claims: Option<Arc<UserPermissions>>,
    pub permissions: Option<Arc<Permissions>>,
    pub subscriptions: Option<Arc<SubscriptionSnapshot>>,
}

impl SessionState {
    /// Snapshot to evaluate entitlement against. `None` evaluates as tier `none`.
    pub fn snapshot(&self) -> Option<&SubscriptionSnapshot> {
        self.subscriptions.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some() || self.claims.is_some()
    }

    pub(crate) fn next(
        &self,
        phase: SessionPhase,
        user_id: Option<String>,
        claims: Option<Arc<UserPermissions>>,
        subscriptions: Option<Arc<SubscriptionSnapshot>>,
    ) -> Self {
        let permissions = claims
            .as_deref()
            .map(|claims| Arc::new(Permissions::derive(claims, subscriptions.as_deref())));

        Self {
            revision: self.revision + 1,
            phase,
            user_id,
            claims,
            permissions,
            subscriptions,
        }
    }
}

/// Sign-in and sign-out notifications from the identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdentityEvent {
    SignedIn { user_id: String },
    SignedOut,
}

/// Port to the permissions and subscription endpoints.
pub trait AccountService: Send + Sync {
    fn fetch_permissions(&self) -> std::result::Result<UserPermissions, FetchError>;

    fn fetch_subscription_status(&self) -> std::result::Result<SubscriptionStatus, FetchError>;
}

/// Synchronously notified after every session change.
///
/// Called while the store's write lock is held: implementations must not
/// write to the session store.
pub trait SessionObserver: Send + Sync {
    fn session_changed(&self, state: &Arc<SessionState>);
}
