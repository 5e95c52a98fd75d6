//! The session store: permissions and subscription snapshot for the viewer.

use crate::entitlement::SubscriptionSnapshot;
use crate::error::Result;
use crate::events::{EventBus, EventConfig, EventHandle, SessionEvent};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

use super::types::{
    AccountService, IdentityEvent, SessionObserver, SessionPhase, SessionState, SubscriptionStatus,
    UserPermissions,
};

/// Owner of the viewer's session.
///
/// Single writer, many readers. Every write installs a complete new
/// [`SessionState`] under one lock, so a reader never sees claims from one
/// revision next to a snapshot from another, and derived permissions always
/// match the snapshot they were derived from. Observers are notified
/// synchronously, in revision order, before the write returns.
pub struct SessionStore {
    state: RwLock<Arc<SessionState>>,

    /// Serializes writes and their notifications.
    write_lock: Mutex<()>,

    observers: RwLock<Vec<Weak<dyn SessionObserver>>>,

    events: EventBus<SessionEvent>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Arc::new(SessionState::default())),
            write_lock: Mutex::new(()),
            observers: RwLock::new(Vec::new()),
            events: EventBus::new(),
        }
    }

    /// Current revision. Cheap; clones an `Arc`.
    pub fn current(&self) -> Arc<SessionState> {
        Arc::clone(&self.state.read())
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.read().phase
    }

    /// Register an observer. Held weakly; dropped observers are pruned.
    pub fn observe(&self, observer: Weak<dyn SessionObserver>) {
        self.observers.write().push(observer);
    }

    /// Open an event stream for UI readers.
    pub fn subscribe(&self, config: EventConfig) -> EventHandle<SessionEvent> {
        self.events.subscribe(config)
    }

    pub fn events(&self) -> &EventBus<SessionEvent> {
        &self.events
    }

    // --- Writes ---

    /// Replace the identity claims.
    pub fn set_permissions(&self, claims: Option<UserPermissions>) {
        self.replace(|current| {
            current.next(
                SessionPhase::Active,
                current.user_id.clone(),
                claims.map(Arc::new),
                current.subscriptions.clone(),
            )
        });
    }

    /// Replace the subscription snapshot.
    pub fn set_subscriptions(&self, snapshot: Option<SubscriptionSnapshot>) {
        self.replace(|current| {
            current.next(
                SessionPhase::Active,
                current.user_id.clone(),
                current.claims.clone(),
                snapshot.map(Arc::new),
            )
        });
    }

    /// Replace the snapshot from a subscription status response.
    pub fn set_subscription_status(&self, status: Option<&SubscriptionStatus>) {
        self.set_subscriptions(status.map(SubscriptionStatus::snapshot));
    }

    /// Replace claims and snapshot together in one revision.
    pub fn set_session(&self, claims: Option<UserPermissions>, snapshot: Option<SubscriptionSnapshot>) {
        self.replace(|current| {
            current.next(
                SessionPhase::Active,
                current.user_id.clone(),
                claims.map(Arc::new),
                snapshot.map(Arc::new),
            )
        });
    }

    /// Sign-out: reset both fields. Observers (the feed engine) reset before this returns.
    pub fn clear_auth(&self) {
        self.replace(|current| current.next(SessionPhase::Cleared, None, None, None));
    }

    /// Fetch claims and subscription status and install both in one revision.
    ///
    /// On failure nothing is replaced.
    pub fn refresh(&self, service: &dyn AccountService) -> Result<()> {
        let claims = service.fetch_permissions()?;
        let status = service.fetch_subscription_status()?;
        self.set_session(Some(claims), Some(status.snapshot()));
        Ok(())
    }

    /// Map identity provider events onto store writes.
    ///
    /// Signing in as a different user passes through `Cleared` first.
    pub fn handle_identity(&self, event: IdentityEvent) {
        match event {
            IdentityEvent::SignedIn { user_id } => {
                let previous = self.current().user_id.clone();
                if previous.as_deref() == Some(user_id.as_str()) {
                    return;
                }
                if previous.is_some() {
                    self.clear_auth();
                }
                self.replace(|current| {
                    current.next(
                        SessionPhase::Active,
                        Some(user_id),
                        current.claims.clone(),
                        current.subscriptions.clone(),
                    )
                });
            }
            IdentityEvent::SignedOut => self.clear_auth(),
        }
    }

    fn replace<F>(&self, f: F)
    where
        F: FnOnce(&SessionState) -> SessionState,
    {
        let _lock = self.write_lock.lock();

        let next = {
            let mut state = self.state.write();
            let next = Arc::new(f(&state));
            *state = Arc::clone(&next);
            next
        };

        debug!(
            revision = next.revision,
            phase = ?next.phase,
            platform_tier = %next.snapshot().map(|s| s.platform).unwrap_or_default(),
            "session replaced"
        );

        self.notify(&next);

        let event = match next.phase {
            SessionPhase::Cleared => {
                info!(revision = next.revision, "session cleared");
                SessionEvent::Cleared {
                    revision: next.revision,
                }
            }
            phase => SessionEvent::Replaced {
                revision: next.revision,
                phase,
                platform_tier: next.snapshot().map(|s| s.platform).unwrap_or_default(),
                has_permissions: next.permissions.is_some(),
            },
        };
        self.events.broadcast(event);
    }

    fn notify(&self, state: &Arc<SessionState>) {
        let observers: Vec<Arc<dyn SessionObserver>> = {
            let mut observers = self.observers.write();
            observers.retain(|weak| weak.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };

        for observer in observers {
            observer.session_changed(state);
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::SubscriptionTier;
    use crate::error::{EngineError, FetchError};
    use crate::session::SubscriptionStatus;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(u64, SessionPhase, Option<SubscriptionTier>)>>,
    }

    impl SessionObserver for Recorder {
        fn session_changed(&self, state: &Arc<SessionState>) {
            self.seen
                .lock()
                .push((state.revision, state.phase, state.snapshot().map(|s| s.platform)));
        }
    }

    struct FailingAccount {
        calls: AtomicU64,
    }

    impl AccountService for FailingAccount {
        fn fetch_permissions(&self) -> std::result::Result<UserPermissions, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(UserPermissions::default())
        }

        fn fetch_subscription_status(&self) -> std::result::Result<SubscriptionStatus, FetchError> {
            Err(FetchError::Status {
                code: 503,
                message: "unavailable".into(),
            })
        }
    }

    #[test]
    fn test_lifecycle() {
        let store = SessionStore::new();
        assert_eq!(store.phase(), SessionPhase::Uninitialized);

        store.set_subscriptions(Some(SubscriptionSnapshot::platform(SubscriptionTier::Basic)));
        assert_eq!(store.phase(), SessionPhase::Active);

        store.clear_auth();
        let state = store.current();
        assert_eq!(state.phase, SessionPhase::Cleared);
        assert!(state.permissions.is_none());
        assert!(state.subscriptions.is_none());
    }

    #[test]
    fn test_observer_notified_in_order() {
        let store = SessionStore::new();
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn SessionObserver> = recorder.clone();
        store.observe(Arc::downgrade(&observer));

        store.set_subscriptions(Some(SubscriptionSnapshot::platform(SubscriptionTier::Premium)));
        store.clear_auth();

        let seen = recorder.seen.lock().clone();
        assert_eq!(
            seen,
            vec![
                (1, SessionPhase::Active, Some(SubscriptionTier::Premium)),
                (2, SessionPhase::Cleared, None),
            ]
        );
    }

    #[test]
    fn test_dropped_observer_pruned() {
        let store = SessionStore::new();
        {
            let observer: Arc<dyn SessionObserver> = Arc::new(Recorder::default());
            store.observe(Arc::downgrade(&observer));
        }
        store.clear_auth();
        assert!(store.observers.read().is_empty());
    }

    #[test]
    fn test_permissions_follow_snapshot() {
        let store = SessionStore::new();
        store.set_permissions(Some(UserPermissions::default()));
        assert!(!store.current().permissions.as_ref().unwrap().is_premium);

        store.set_subscriptions(Some(SubscriptionSnapshot::platform(SubscriptionTier::Premium)));
        assert!(store.current().permissions.as_ref().unwrap().is_premium);
    }

    #[test]
    fn test_refresh_failure_keeps_last_known_good() {
        let store = SessionStore::new();
        store.set_subscriptions(Some(SubscriptionSnapshot::platform(SubscriptionTier::Basic)));
        let before = store.current().revision;

        let account = FailingAccount {
            calls: AtomicU64::new(0),
        };
        let result = store.refresh(&account);

        assert!(matches!(result, Err(EngineError::Fetch(FetchError::Status { code: 503, .. }))));
        assert_eq!(account.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.current().revision, before);
        assert_eq!(
            store.current().snapshot().map(|s| s.platform),
            Some(SubscriptionTier::Basic)
        );
    }

    #[test]
    fn test_switching_user_passes_through_cleared() {
        let store = SessionStore::new();
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn SessionObserver> = recorder.clone();
        store.observe(Arc::downgrade(&observer));

        store.handle_identity(IdentityEvent::SignedIn {
            user_id: "u1".into(),
        });
        store.set_subscriptions(Some(SubscriptionSnapshot::platform(SubscriptionTier::Premium)));
        store.handle_identity(IdentityEvent::SignedIn {
            user_id: "u2".into(),
        });

        let phases: Vec<SessionPhase> = recorder.seen.lock().iter().map(|s| s.1).collect();
        assert_eq!(
            phases,
            vec![
                SessionPhase::Active,
                SessionPhase::Active,
                SessionPhase::Cleared,
                SessionPhase::Active
            ]
        );
        let state = store.current();
        assert_eq!(state.user_id.as_deref(), Some("u2"));
        assert!(state.subscriptions.is_none());
    }

    #[test]
    fn test_same_user_sign_in_is_noop() {
        let store = SessionStore::new();
        store.handle_identity(IdentityEvent::SignedIn {
            user_id: "u1".into(),
        });
        let revision = store.current().revision;
        store.handle_identity(IdentityEvent::SignedIn {
            user_id: "u1".into(),
        });
        assert_eq!(store.current().revision, revision);
    }

    #[test]
    fn test_events_broadcast() {
        let store = SessionStore::new();
        let handle = store.subscribe(EventConfig::default());

        store.set_subscriptions(Some(SubscriptionSnapshot::platform(SubscriptionTier::Basic)));
        store.handle_identity(IdentityEvent::SignedOut);

        let events = handle.drain();
        assert_eq!(
            events,
            vec![
                SessionEvent::Replaced {
                    revision: 1,
                    phase: SessionPhase::Active,
                    platform_tier: SubscriptionTier::Basic,
                    has_permissions: false,
                },
                SessionEvent::Cleared { revision: 2 },
            ]
        );
    }
}
