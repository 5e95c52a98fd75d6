//! Feed engine types.

use crate::entitlement::{view, AccessDecision, ItemView};
use crate::error::FetchError;
use crate::types::{ContentItem, Cursor, FeedPage, PostId};
use std::sync::Arc;

/// Feed engine configuration.
#[derive(Clone, Debug)]
pub struct FeedConfig {
    /// Posts requested per page.
    pub page_size: usize,

    /// Opened posts kept for detail views.
    pub post_cache_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            post_cache_size: 100,
        }
    }
}

/// One request to the content service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeedRequest<'a> {
    /// `None` requests the first page.
    pub cursor: Option<&'a Cursor>,
    pub limit: usize,
}

/// Port to the content service (`GET feed?cursor=&limit=`).
pub trait FeedSource: Send + Sync {
    fn fetch_page(&self, request: FeedRequest<'_>) -> std::result::Result<FeedPage, FetchError>;
}

/// Permission to perform one page fetch, tagged with the feed state it was issued against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub(crate) id: u64,
    pub(crate) generation: u64,
    cursor: Option<Cursor>,
    limit: usize,
}

impl FetchTicket {
    pub(crate) fn new(id: u64, generation: u64, cursor: Option<Cursor>, limit: usize) -> Self {
        Self {
            id,
            generation,
            cursor,
            limit,
        }
    }

    /// Cursor to send; `None` for the first page.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> FeedRequest<'_> {
        FeedRequest {
            cursor: self.cursor.as_ref(),
            limit: self.limit,
        }
    }
}

/// Result of completing a fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged {
        added: usize,
        replaced: usize,
        exhausted: bool,
    },
    /// The feed was reset or advanced while the fetch was in flight.
    Discarded,
}

impl MergeOutcome {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, MergeOutcome::Merged { exhausted: true, .. })
    }
}

/// An item with its current effective access.
#[derive(Clone, Debug, PartialEq)]
pub struct StampedItem {
    pub item: Arc<ContentItem>,
    pub access: AccessDecision,
}

impl StampedItem {
    pub fn id(&self) -> &PostId {
        &self.item.id
    }

    /// Degree of content to render.
    pub fn view(&self) -> ItemView<'_> {
        view(&self.item, &self.access)
    }
}

/// Point-in-time copy of the merged feed.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedFeed {
    pub generation: u64,
    pub items: Vec<StampedItem>,
    /// Next page cursor, if any.
    pub cursor: Option<Cursor>,
    pub exhausted: bool,
}

impl MergedFeed {
    pub fn ids(&self) -> Vec<&PostId> {
        self.items.iter().map(StampedItem::id).collect()
    }
}

/// Where the next fetch starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Frontier {
    Start,
    Next(Cursor),
    Exhausted,
}

impl Frontier {
    pub(crate) fn cursor(&self) -> Option<&Cursor> {
        match self {
            Frontier::Next(cursor) => Some(cursor),
            _ => None,
        }
    }
}
