//! Paginated feed state.
//!
//! Merges cursor-paginated pages into one de-duplicated, insertion-ordered
//! list and keeps each item's effective access current as the session
//! changes. Items are never re-fetched to change their access.

mod engine;
mod types;

pub use engine::FeedEngine;
pub use types::{
    FeedConfig, FeedRequest, FeedSource, FetchTicket, MergeOutcome, MergedFeed, StampedItem,
};
