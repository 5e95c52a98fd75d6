//! Core types shared by the feed, session and ledger components.

use crate::entitlement::SubscriptionTier;
use crate::error::FetchError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a content item (post).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        PostId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PostId({})", self.0)
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a content author that viewers can subscribe to individually.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatorId(pub String);

impl CreatorId {
    pub fn new(id: impl Into<String>) -> Self {
        CreatorId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CreatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CreatorId({})", self.0)
    }
}

impl fmt::Display for CreatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque pagination token issued by the content service.
///
/// Round-tripped verbatim; never parsed or built from parts.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Cursor(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cursor({})", self.0)
    }
}

/// Author metadata. Visible even when the item body is locked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub is_premium: bool,
}

/// A post as delivered by the content service.
///
/// Immutable once fetched. `has_access` is the server's decision for the
/// viewer the page was fetched for; a missing flag reads as `false`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: PostId,

    #[serde(default)]
    pub author: Author,

    /// Body payload. Withheld from locked views.
    #[serde(default)]
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default)]
    pub likes: u64,

    #[serde(default)]
    pub comments: u64,

    #[serde(default)]
    pub shares: u64,

    #[serde(default)]
    pub is_premium_post: bool,

    #[serde(default)]
    pub timestamp: String,

    #[serde(default)]
    pub liked: bool,

    /// Platform-wide gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_subscription_tier: Option<SubscriptionTier>,

    /// Creator-specific gate, resolved against `creator_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_tier_required: Option<SubscriptionTier>,

    #[serde(default)]
    pub has_access: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<CreatorId>,
}

impl ContentItem {
    /// Create an ungated item the server granted access to.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: PostId::new(id),
            author: Author::default(),
            content: content.into(),
            image: None,
            likes: 0,
            comments: 0,
            shares: 0,
            is_premium_post: false,
            timestamp: String::new(),
            liked: false,
            required_subscription_tier: None,
            minimum_tier_required: None,
            has_access: true,
            creator_id: None,
        }
    }

    /// Set the platform-wide gate.
    pub fn with_required_tier(mut self, tier: SubscriptionTier) -> Self {
        self.required_subscription_tier = Some(tier);
        self.is_premium_post = true;
        self
    }

    /// Set the creator-specific gate and the creator it applies to.
    pub fn with_creator_gate(mut self, creator: impl Into<String>, tier: SubscriptionTier) -> Self {
        self.creator_id = Some(CreatorId::new(creator));
        self.minimum_tier_required = Some(tier);
        self.is_premium_post = true;
        self
    }

    /// Set the server-computed access flag.
    pub fn with_server_access(mut self, has_access: bool) -> Self {
        self.has_access = has_access;
        self
    }

    /// Whether any gate is set on this item.
    pub fn is_gated(&self) -> bool {
        self.required_subscription_tier.is_some() || self.minimum_tier_required.is_some()
    }
}

/// One page of the feed as returned by `GET feed?cursor=`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    #[serde(default)]
    pub posts: Vec<ContentItem>,

    /// Absent, null or empty means end of feed.
    #[serde(
        default,
        deserialize_with = "deserialize_cursor",
        skip_serializing_if = "Option::is_none"
    )]
    pub next_page_cursor: Option<Cursor>,
}

impl FeedPage {
    pub fn new(posts: Vec<ContentItem>, next_page_cursor: Option<Cursor>) -> Self {
        Self {
            posts,
            next_page_cursor,
        }
    }

    /// Decode a page from the content service's JSON body.
    pub fn from_json(body: &[u8]) -> std::result::Result<Self, FetchError> {
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Whether this page ends pagination.
    pub fn is_last(&self) -> bool {
        self.next_page_cursor.is_none() || self.posts.is_empty()
    }
}

fn deserialize_cursor<'de, D>(deserializer: D) -> std::result::Result<Option<Cursor>, D::Error>
where
    D: Deserializer<'de>,
{
    let token: Option<String> = Option::deserialize(deserializer)?;
    Ok(token.filter(|t| !t.is_empty()).map(Cursor))
}

/// A user-entered ledger record (transaction).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
}

impl LedgerEntry {
    pub fn new(
        date: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            amount,
            category: category.into(),
            description: description.into(),
        }
    }
}
