//! Subscription tiers and the viewer's subscription snapshot.

use crate::types::CreatorId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Totally ordered subscription level.
///
/// Unknown or missing tier ids parse as `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubscriptionTier {
    #[default]
    None,
    Basic,
    Premium,
    CreatorExclusive,
}

impl SubscriptionTier {
    /// All tiers in ascending order.
    pub const ALL: [SubscriptionTier; 4] = [
        SubscriptionTier::None,
        SubscriptionTier::Basic,
        SubscriptionTier::Premium,
        SubscriptionTier::CreatorExclusive,
    ];

    /// Map a tier id from any of the services onto the ordering. Total.
    pub fn parse(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "basic" | "creator-basic" | "basic-monthly" | "basic-yearly" => SubscriptionTier::Basic,
            "premium" | "pro" | "creator-pro" | "premium-monthly" | "premium-yearly"
            | "platform-premium" => SubscriptionTier::Premium,
            "creator-exclusive" | "exclusive" | "vip" | "creator-vip" => {
                SubscriptionTier::CreatorExclusive
            }
            _ => SubscriptionTier::None,
        }
    }

    /// Canonical id.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::None => "none",
            SubscriptionTier::Basic => "basic",
            SubscriptionTier::Premium => "premium",
            SubscriptionTier::CreatorExclusive => "creator-exclusive",
        }
    }

    /// Whether holding `self` satisfies a gate of `required`.
    pub fn satisfies(self, required: SubscriptionTier) -> bool {
        self >= required
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubscriptionTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubscriptionTier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let id = String::deserialize(deserializer)?;
        Ok(SubscriptionTier::parse(&id))
    }
}

/// The viewer's tiers at one point in time.
///
/// Immutable; the session store replaces it wholesale.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    /// Platform-wide tier.
    pub platform: SubscriptionTier,

    /// Per-creator tiers.
    #[serde(default)]
    pub creators: BTreeMap<CreatorId, SubscriptionTier>,
}

impl SubscriptionSnapshot {
    /// Snapshot of a viewer with no subscriptions (also used for a signed-out viewer).
    pub fn none() -> Self {
        Self::default()
    }

    /// Snapshot with only a platform tier.
    pub fn platform(tier: SubscriptionTier) -> Self {
        Self {
            platform: tier,
            creators: BTreeMap::new(),
        }
    }

    /// Add a creator subscription. Keeps the higher tier on repeats.
    pub fn with_creator(mut self, creator: impl Into<String>, tier: SubscriptionTier) -> Self {
        let entry = self
            .creators
            .entry(CreatorId::new(creator))
            .or_insert(SubscriptionTier::None);
        *entry = (*entry).max(tier);
        self
    }

    /// Tier held for a specific creator, if subscribed.
    pub fn creator_tier(&self, creator: &CreatorId) -> Option<SubscriptionTier> {
        self.creators.get(creator).copied()
    }

    /// Highest tier held anywhere.
    pub fn highest(&self) -> SubscriptionTier {
        self.creators
            .values()
            .copied()
            .fold(self.platform, SubscriptionTier::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(SubscriptionTier::None < SubscriptionTier::Basic);
        assert!(SubscriptionTier::Basic < SubscriptionTier::Premium);
        assert!(SubscriptionTier::Premium < SubscriptionTier::CreatorExclusive);
    }

    #[test]
    fn test_parse_service_ids() {
        assert_eq!(SubscriptionTier::parse("premium-monthly"), SubscriptionTier::Premium);
        assert_eq!(SubscriptionTier::parse("platform-premium"), SubscriptionTier::Premium);
        assert_eq!(SubscriptionTier::parse("creator-basic"), SubscriptionTier::Basic);
        assert_eq!(SubscriptionTier::parse("pro"), SubscriptionTier::Premium);
        assert_eq!(SubscriptionTier::parse("VIP"), SubscriptionTier::CreatorExclusive);
        assert_eq!(SubscriptionTier::parse(" basic "), SubscriptionTier::Basic);
    }

    #[test]
    fn test_unknown_tier_is_none() {
        assert_eq!(SubscriptionTier::parse(""), SubscriptionTier::None);
        assert_eq!(SubscriptionTier::parse("gold-plus"), SubscriptionTier::None);
    }

    #[test]
    fn test_serde_canonical_ids() {
        let json = serde_json::to_string(&SubscriptionTier::CreatorExclusive).unwrap();
        assert_eq!(json, "\"creator-exclusive\"");

        let tier: SubscriptionTier = serde_json::from_str("\"premium-yearly\"").unwrap();
        assert_eq!(tier, SubscriptionTier::Premium);
    }

    #[test]
    fn test_snapshot_creator_keeps_highest() {
        let snapshot = SubscriptionSnapshot::none()
            .with_creator("c1", SubscriptionTier::Premium)
            .with_creator("c1", SubscriptionTier::Basic);

        assert_eq!(
            snapshot.creator_tier(&CreatorId::new("c1")),
            Some(SubscriptionTier::Premium)
        );
        assert_eq!(snapshot.creator_tier(&CreatorId::new("c2")), None);
        assert_eq!(snapshot.highest(), SubscriptionTier::Premium);
    }
}
