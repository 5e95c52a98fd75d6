//! Event streams for readers of the session store and the merged feed.
//!
//! Listeners get a bounded channel. A listener that falls behind is removed
//! and receives a final `Dropped` event if there is room for it.
//!
//! # Example
//!
//! ```ignore
//! let handle = engine.subscribe(EventConfig::default());
//!
//! loop {
//!     match handle.recv() {
//!         Ok(FeedEvent::Restamped { unlocked, .. }) => redraw(unlocked),
//!         Ok(FeedEvent::Dropped { .. }) | Err(_) => break,
//!         Ok(_) => {}
//!     }
//! }
//! ```

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{BusEvent, DropReason, EventConfig, EventHandle, FeedEvent, ListenerId, SessionEvent};
