//! Bounded broadcast bus.

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use super::types::{BusEvent, DropReason, EventConfig, EventHandle, ListenerId};

/// The channel holds one slot past `capacity` for the final drop notice.
struct Listener<E> {
    sender: Sender<E>,
    capacity: usize,
}

impl<E> Listener<E> {
    /// Try to send an event. Returns false if the buffer is full or the handle is gone.
    fn try_send(&self, event: E) -> bool {
        if self.sender.len() >= self.capacity {
            return false;
        }
        self.sender.try_send(event).is_ok()
    }

    /// Send the drop notice into the reserved slot.
    fn send_final(&self, event: E) {
        let _ = self.sender.try_send(event);
    }
}

/// Broadcasts events to listeners, dropping the ones that fall behind.
pub struct EventBus<E: BusEvent> {
    listeners: RwLock<HashMap<ListenerId, Listener<E>>>,
    next_id: AtomicU64,
}

impl<E: BusEvent> EventBus<E> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener.
    pub fn subscribe(&self, config: EventConfig) -> EventHandle<E> {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let capacity = config.buffer_size.max(1);
        let (sender, receiver) = bounded(capacity + 1);

        self.listeners
            .write()
            .insert(id, Listener { sender, capacity });

        EventHandle { id, receiver }
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: ListenerId) {
        if let Some(listener) = self.listeners.write().remove(&id) {
            listener.send_final(E::dropped(DropReason::Unsubscribed));
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Send an event to every listener. Drops listeners that fail to receive.
    pub fn broadcast(&self, event: E) {
        let mut to_remove = Vec::new();

        {
            let listeners = self.listeners.read();
            for (id, listener) in listeners.iter() {
                if !listener.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut listeners = self.listeners.write();
            for id in to_remove {
                if let Some(listener) = listeners.remove(&id) {
                    warn!(listener = id.0, "dropping slow event listener");
                    listener.send_final(E::dropped(DropReason::BufferOverflow));
                }
            }
        }
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
