//! Event types for store and feed listeners.

use crate::entitlement::SubscriptionTier;
use crate::session::SessionPhase;
use crate::types::PostId;
use serde::{Deserialize, Serialize};

/// Configuration for a listener.
#[derive(Clone, Debug)]
pub struct EventConfig {
    /// Max buffered events before dropping the listener.
    /// Default: 1000
    pub buffer_size: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { buffer_size: 1000 }
    }
}

/// Why a listener was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// An event that can travel over an [`EventBus`](super::EventBus).
pub trait BusEvent: Clone + Send + 'static {
    /// The final event sent to a listener that is being removed.
    fn dropped(reason: DropReason) -> Self;
}

/// Changes to the session store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Permissions and/or subscriptions were replaced.
    Replaced {
        revision: u64,
        phase: SessionPhase,
        platform_tier: SubscriptionTier,
        has_permissions: bool,
    },

    /// Sign-out: both fields reset.
    Cleared { revision: u64 },

    /// Listener was dropped.
    Dropped { reason: DropReason },
}

impl BusEvent for SessionEvent {
    fn dropped(reason: DropReason) -> Self {
        SessionEvent::Dropped { reason }
    }
}

/// Changes to the merged feed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    /// A page was merged.
    PageMerged {
        generation: u64,
        added: usize,
        replaced: usize,
        exhausted: bool,
    },

    /// Every item was re-evaluated after a session change.
    Restamped {
        generation: u64,
        unlocked: usize,
        relocked: usize,
    },

    /// Feed and cursor were cleared.
    Reset { generation: u64 },

    /// A locally composed post was put at the front.
    ItemInserted { id: PostId },

    /// An item was removed.
    ItemRemoved { id: PostId },

    /// Listener was dropped.
    Dropped { reason: DropReason },
}

impl BusEvent for FeedEvent {
    fn dropped(reason: DropReason) -> Self {
        FeedEvent::Dropped { reason }
    }
}

/// Unique identifier for a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle to a listener's event stream.
pub struct EventHandle<E> {
    pub id: ListenerId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<E>,
}

impl<E> EventHandle<E> {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<E, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<E, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<E, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently buffered.
    pub fn drain(&self) -> Vec<E> {
        self.receiver.try_iter().collect()
    }
}
