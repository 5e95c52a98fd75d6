//! Feed engine: cursor pagination, de-duplicating merge and reactive re-stamping.

use crate::entitlement::effective_access;
use crate::error::{EngineError, FetchError, Result};
use crate::events::{EventBus, EventConfig, EventHandle, FeedEvent};
use crate::session::{SessionObserver, SessionPhase, SessionState, SessionStore};
use crate::types::{ContentItem, Cursor, FeedPage, PostId};
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

use super::types::{
    FeedConfig, FeedSource, FetchTicket, Frontier, MergeOutcome, MergedFeed, StampedItem,
};

/// Everything guarded by the engine's state lock.
struct FeedState {
    /// Insertion-ordered, unique by id.
    items: Vec<StampedItem>,
    /// Id -> index into `items`.
    positions: HashMap<PostId, usize>,
    frontier: Frontier,
    /// Bumped on every reset; fetches issued under an older generation are discarded.
    generation: u64,
    next_ticket: u64,
    in_flight: Option<u64>,
    /// Session revision the items are currently stamped against.
    session: Arc<SessionState>,
}

impl FeedState {
    fn new(session: Arc<SessionState>) -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
            frontier: Frontier::Start,
            generation: 0,
            next_ticket: 0,
            in_flight: None,
            session,
        }
    }

    fn stamp(&self, item: Arc<ContentItem>) -> StampedItem {
        let access = effective_access(&item, self.session.snapshot());
        StampedItem { item, access }
    }

    fn reindex(&mut self) {
        self.positions = self
            .items
            .iter()
            .enumerate()
            .map(|(index, stamped)| (stamped.item.id.clone(), index))
            .collect();
    }

    /// Last write wins on a duplicate id; the first-seen position is kept.
    /// Only a reset reopens an exhausted frontier.
    fn merge(&mut self, page: FeedPage) -> (usize, usize, bool) {
        let exhausted = page.is_last() || self.frontier == Frontier::Exhausted;
        let mut added = 0;
        let mut replaced = 0;

        for post in page.posts {
            let stamped = self.stamp(Arc::new(post));
            match self.positions.get(&stamped.item.id).copied() {
                Some(index) => {
                    self.items[index] = stamped;
                    replaced += 1;
                }
                None => {
                    self.positions
                        .insert(stamped.item.id.clone(), self.items.len());
                    self.items.push(stamped);
                    added += 1;
                }
            }
        }

        self.frontier = match page.next_page_cursor {
            Some(cursor) if !exhausted => Frontier::Next(cursor),
            _ => Frontier::Exhausted,
        };

        (added, replaced, exhausted)
    }

    /// Re-evaluate every item. Returns (unlocked, relocked).
    fn restamp(&mut self) -> (usize, usize) {
        let session = Arc::clone(&self.session);
        let snapshot = session.snapshot();
        let mut unlocked = 0;
        let mut relocked = 0;

        for stamped in self.items.iter_mut() {
            let access = effective_access(&stamped.item, snapshot);
            if stamped.access.is_locked() && access.is_full() {
                unlocked += 1;
            } else if stamped.access.is_full() && access.is_locked() {
                relocked += 1;
            }
            stamped.access = access;
        }

        (unlocked, relocked)
    }

    fn reset(&mut self) {
        self.items.clear();
        self.positions.clear();
        self.frontier = Frontier::Start;
        self.generation += 1;
        self.in_flight = None;
    }
}

/// Owner of the merged feed.
///
/// The engine never fetches on its own. Callers drive pagination with
/// [`load_next_page`](Self::load_next_page), or with
/// [`begin_fetch`](Self::begin_fetch) / [`complete_fetch`](Self::complete_fetch)
/// when the network call happens elsewhere. Only one fetch may be outstanding.
///
/// The engine observes the [`SessionStore`] it was created with and
/// re-stamps every item synchronously on each session change; a sign-out
/// resets the feed.
pub struct FeedEngine {
    config: FeedConfig,
    state: RwLock<FeedState>,
    /// Opened posts for detail views. Stamped at read time.
    cache: Mutex<LruCache<PostId, Arc<ContentItem>>>,
    events: EventBus<FeedEvent>,
}

impl FeedEngine {
    /// Create an engine bound to a session store.
    pub fn new(config: FeedConfig, session: &SessionStore) -> Arc<Self> {
        let capacity = NonZeroUsize::new(config.post_cache_size).unwrap_or(NonZeroUsize::MIN);

        let engine = Arc::new(Self {
            config,
            state: RwLock::new(FeedState::new(session.current())),
            cache: Mutex::new(LruCache::new(capacity)),
            events: EventBus::new(),
        });

        let observer: Weak<FeedEngine> = Arc::downgrade(&engine);
        session.observe(observer);

        // A write may have landed between construction and registration.
        engine.session_changed(&session.current());

        engine
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Open an event stream for UI readers.
    pub fn subscribe(&self, config: EventConfig) -> EventHandle<FeedEvent> {
        self.events.subscribe(config)
    }

    // --- Pagination ---

    /// Fetch the next page from `source` and merge it.
    ///
    /// Fails with `FeedExhausted` once the end was reached, `FetchInFlight`
    /// while another fetch is outstanding, and `Fetch` when the source fails
    /// (the feed is left untouched; no retry).
    pub fn load_next_page(&self, source: &dyn FeedSource) -> Result<MergeOutcome> {
        let ticket = self.begin_fetch()?;
        debug!(
            cursor = ?ticket.cursor(),
            generation = ticket.generation(),
            "fetching page"
        );
        let result = source.fetch_page(ticket.request());
        self.complete_fetch(ticket, result)
    }

    /// Reserve the single fetch slot and get the cursor to request.
    pub fn begin_fetch(&self) -> Result<FetchTicket> {
        let mut state = self.state.write();

        if state.frontier == Frontier::Exhausted {
            return Err(EngineError::FeedExhausted);
        }
        if state.in_flight.is_some() {
            return Err(EngineError::FetchInFlight);
        }

        state.next_ticket += 1;
        let id = state.next_ticket;
        state.in_flight = Some(id);

        Ok(FetchTicket::new(
            id,
            state.generation,
            state.frontier.cursor().cloned(),
            self.config.page_size,
        ))
    }

    /// Hand back the outcome of a fetch started with [`begin_fetch`](Self::begin_fetch).
    ///
    /// A ticket from before a reset, or whose cursor is no longer the
    /// frontier, is discarded without touching the feed.
    pub fn complete_fetch(
        &self,
        ticket: FetchTicket,
        result: std::result::Result<FeedPage, FetchError>,
    ) -> Result<MergeOutcome> {
        let event = {
            let mut state = self.state.write();

            if state.in_flight != Some(ticket.id) || state.generation != ticket.generation {
                debug!(
                    ticket_generation = ticket.generation,
                    generation = state.generation,
                    "discarding stale page"
                );
                return Ok(MergeOutcome::Discarded);
            }
            state.in_flight = None;

            let expected = match ticket.cursor() {
                Some(cursor) => Frontier::Next(cursor.clone()),
                None => Frontier::Start,
            };
            if state.frontier != expected {
                debug!(cursor = ?ticket.cursor(), "discarding page for superseded cursor");
                return Ok(MergeOutcome::Discarded);
            }

            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, cursor = ?ticket.cursor(), "page fetch failed");
                    return Err(e.into());
                }
            };

            Self::merge_locked(&mut state, page)
        };

        Ok(self.publish_merge(event))
    }

    /// Merge a page into the feed and advance the frontier.
    ///
    /// Items are merged even after the end was reached, but the feed stays
    /// exhausted until [`reset`](Self::reset).
    pub fn merge_page(&self, page: FeedPage) -> MergeOutcome {
        let event = {
            let mut state = self.state.write();
            Self::merge_locked(&mut state, page)
        };
        self.publish_merge(event)
    }

    fn merge_locked(state: &mut FeedState, page: FeedPage) -> FeedEvent {
        let (added, replaced, exhausted) = state.merge(page);
        info!(
            added,
            replaced,
            exhausted,
            total = state.items.len(),
            "page merged"
        );
        FeedEvent::PageMerged {
            generation: state.generation,
            added,
            replaced,
            exhausted,
        }
    }

    fn publish_merge(&self, event: FeedEvent) -> MergeOutcome {
        let outcome = match &event {
            FeedEvent::PageMerged {
                added,
                replaced,
                exhausted,
                ..
            } => MergeOutcome::Merged {
                added: *added,
                replaced: *replaced,
                exhausted: *exhausted,
            },
            _ => MergeOutcome::Discarded,
        };
        self.events.broadcast(event);
        outcome
    }

    /// Clear the feed, the frontier and the post cache. Any in-flight fetch is abandoned.
    pub fn reset(&self) {
        let generation = {
            let mut state = self.state.write();
            state.reset();
            state.generation
        };
        self.cache.lock().clear();

        info!(generation, "feed reset");
        self.events.broadcast(FeedEvent::Reset { generation });
    }

    // --- Local edits ---

    /// Put a freshly composed post at the front. No-op if the id is present.
    pub fn add_local_post(&self, item: ContentItem) -> bool {
        let id = {
            let mut state = self.state.write();
            if state.positions.contains_key(&item.id) {
                return false;
            }
            let stamped = state.stamp(Arc::new(item));
            let id = stamped.item.id.clone();
            state.items.insert(0, stamped);
            state.reindex();
            id
        };

        self.events.broadcast(FeedEvent::ItemInserted { id });
        true
    }

    /// Remove an item. The rest keep their relative order.
    pub fn remove_post(&self, id: &PostId) -> Option<StampedItem> {
        let removed = {
            let mut state = self.state.write();
            let index = state.positions.get(id).copied()?;
            let removed = state.items.remove(index);
            state.reindex();
            removed
        };
        self.cache.lock().pop(id);

        self.events.broadcast(FeedEvent::ItemRemoved { id: id.clone() });
        Some(removed)
    }

    // --- Detail cache ---

    /// Remember a post opened in a detail view and stamp it.
    pub fn open_post(&self, item: ContentItem) -> StampedItem {
        let item = Arc::new(item);
        self.cache.lock().put(item.id.clone(), Arc::clone(&item));
        self.state.read().stamp(item)
    }

    /// Look a post up in the feed, then in the detail cache.
    pub fn cached_post(&self, id: &PostId) -> Option<StampedItem> {
        if let Some(stamped) = self.get(id) {
            return Some(stamped);
        }
        let item = self.cache.lock().get(id).cloned()?;
        Some(self.state.read().stamp(item))
    }

    // --- Reads ---

    /// Consistent copy of the whole feed.
    pub fn snapshot(&self) -> MergedFeed {
        let state = self.state.read();
        MergedFeed {
            generation: state.generation,
            items: state.items.clone(),
            cursor: state.frontier.cursor().cloned(),
            exhausted: state.frontier == Frontier::Exhausted,
        }
    }

    pub fn items(&self) -> Vec<StampedItem> {
        self.state.read().items.clone()
    }

    pub fn get(&self, id: &PostId) -> Option<StampedItem> {
        let state = self.state.read();
        let index = *state.positions.get(id)?;
        state.items.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.read().frontier == Frontier::Exhausted
    }

    pub fn has_more(&self) -> bool {
        !self.is_exhausted()
    }

    pub fn is_fetching(&self) -> bool {
        self.state.read().in_flight.is_some()
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.state.read().frontier.cursor().cloned()
    }

    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Items the viewer is locally entitled to that the server copy still denies.
    ///
    /// An upgrade unlocks items the server already granted without a fetch.
    /// Items listed here unlock only once the server re-sends them with access.
    pub fn pending_confirmation(&self) -> Vec<PostId> {
        self.state
            .read()
            .items
            .iter()
            .filter(|stamped| stamped.access.awaits_server())
            .map(|stamped| stamped.item.id.clone())
            .collect()
    }
}

impl SessionObserver for FeedEngine {
    fn session_changed(&self, session: &Arc<SessionState>) {
        let event = {
            let mut state = self.state.write();
            if session.revision <= state.session.revision {
                return;
            }
            state.session = Arc::clone(session);

            if session.phase == SessionPhase::Cleared {
                state.reset();
                FeedEvent::Reset {
                    generation: state.generation,
                }
            } else {
                let (unlocked, relocked) = state.restamp();
                debug!(
                    revision = session.revision,
                    unlocked,
                    relocked,
                    total = state.items.len(),
                    "feed restamped"
                );
                FeedEvent::Restamped {
                    generation: state.generation,
                    unlocked,
                    relocked,
                }
            }
        };

        if let FeedEvent::Reset { generation } = event {
            self.cache.lock().clear();
            info!(generation, "feed reset on sign-out");
        }
        self.events.broadcast(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::{SubscriptionSnapshot, SubscriptionTier};
    use crate::feed::FeedRequest;

    /// Serves pages keyed by the cursor they answer.
    struct ScriptedSource {
        pages: Mutex<HashMap<Option<String>, std::result::Result<FeedPage, FetchError>>>,
        requests: Mutex<Vec<(Option<String>, usize)>>,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                pages: Mutex::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn page(self, cursor: Option<&str>, page: FeedPage) -> Self {
            self.pages.lock().insert(cursor.map(String::from), Ok(page));
            self
        }

        fn failing(self, cursor: Option<&str>, error: FetchError) -> Self {
            self.pages.lock().insert(cursor.map(String::from), Err(error));
            self
        }
    }

    impl FeedSource for ScriptedSource {
        fn fetch_page(&self, request: FeedRequest<'_>) -> std::result::Result<FeedPage, FetchError> {
            let key = request.cursor.map(|c| c.as_str().to_string());
            self.requests.lock().push((key.clone(), request.limit));
            self.pages
                .lock()
                .get(&key)
                .cloned()
                .unwrap_or_else(|| Err(FetchError::Status {
                    code: 404,
                    message: "no such page".into(),
                }))
        }
    }

    fn post(id: &str) -> ContentItem {
        ContentItem::new(id, format!("body {}", id))
    }

    fn premium(id: &str, has_access: bool) -> ContentItem {
        post(id)
            .with_required_tier(SubscriptionTier::Premium)
            .with_server_access(has_access)
    }

    fn page(ids: &[&str], next: Option<&str>) -> FeedPage {
        FeedPage::new(ids.iter().map(|id| post(id)).collect(), next.map(Cursor::new))
    }

    fn setup() -> (SessionStore, Arc<FeedEngine>) {
        let session = SessionStore::new();
        let engine = FeedEngine::new(FeedConfig::default(), &session);
        (session, engine)
    }

    fn ids(engine: &FeedEngine) -> Vec<String> {
        engine
            .items()
            .iter()
            .map(|s| s.id().as_str().to_string())
            .collect()
    }

    #[test]
    fn test_pagination_follows_cursor() {
        let (_session, engine) = setup();
        let source = ScriptedSource::new()
            .page(None, page(&["1", "2"], Some("c1")))
            .page(Some("c1"), page(&["3"], None));

        let outcome = engine.load_next_page(&source).unwrap();
        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                added: 2,
                replaced: 0,
                exhausted: false
            }
        );
        assert_eq!(engine.cursor(), Some(Cursor::new("c1")));

        let outcome = engine.load_next_page(&source).unwrap();
        assert!(outcome.is_exhausted());
        assert_eq!(ids(&engine), vec!["1", "2", "3"]);

        let requests = source.requests.lock().clone();
        assert_eq!(requests, vec![(None, 10), (Some("c1".to_string()), 10)]);

        let err = engine.load_next_page(&source).unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(source.requests.lock().len(), 2);
    }

    #[test]
    fn test_merge_dedup_keeps_first_position() {
        let (_session, engine) = setup();
        engine.merge_page(page(&["1", "2", "3"], Some("c1")));

        let mut updated = post("2");
        updated.likes = 42;
        let outcome = engine.merge_page(FeedPage::new(vec![post("4"), updated], Some(Cursor::new("c2"))));

        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                added: 1,
                replaced: 1,
                exhausted: false
            }
        );
        assert_eq!(ids(&engine), vec!["1", "2", "3", "4"]);
        assert_eq!(engine.get(&PostId::new("2")).unwrap().item.likes, 42);
    }

    #[test]
    fn test_merge_same_page_twice_is_idempotent() {
        let (_session, engine) = setup();
        let p = page(&["1", "2"], Some("c1"));

        engine.merge_page(p.clone());
        let once = engine.snapshot();
        engine.merge_page(p);
        let twice = engine.snapshot();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_duplicate_within_page() {
        let (_session, engine) = setup();
        engine.merge_page(page(&["1", "2", "1"], Some("c1")));
        assert_eq!(ids(&engine), vec!["1", "2"]);
    }

    #[test]
    fn test_empty_page_exhausts() {
        let (_session, engine) = setup();
        let outcome = engine.merge_page(page(&[], Some("c9")));
        assert!(outcome.is_exhausted());
        assert!(engine.is_exhausted());
        assert!(matches!(engine.begin_fetch(), Err(EngineError::FeedExhausted)));
    }

    #[test]
    fn test_merge_after_end_stays_exhausted() {
        let (_session, engine) = setup();
        engine.merge_page(page(&["1"], None));

        let outcome = engine.merge_page(page(&["2"], Some("c2")));
        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                added: 1,
                replaced: 0,
                exhausted: true
            }
        );
        assert_eq!(ids(&engine), vec!["1", "2"]);
        assert!(engine.is_exhausted());
        assert_eq!(engine.cursor(), None);
        assert!(matches!(engine.begin_fetch(), Err(EngineError::FeedExhausted)));
    }

    #[test]
    fn test_second_fetch_rejected_while_in_flight() {
        let (_session, engine) = setup();

        let ticket = engine.begin_fetch().unwrap();
        assert!(engine.is_fetching());
        assert!(matches!(engine.begin_fetch(), Err(EngineError::FetchInFlight)));

        engine
            .complete_fetch(ticket, Ok(page(&["1"], Some("c1"))))
            .unwrap();
        assert!(!engine.is_fetching());

        let ticket = engine.begin_fetch().unwrap();
        assert_eq!(ticket.cursor(), Some(&Cursor::new("c1")));
    }

    #[test]
    fn test_stale_fetch_discarded_after_reset() {
        let (_session, engine) = setup();
        engine.merge_page(page(&["1"], Some("c1")));

        let ticket = engine.begin_fetch().unwrap();
        engine.reset();

        let outcome = engine
            .complete_fetch(ticket, Ok(page(&["old"], Some("c2"))))
            .unwrap();
        assert_eq!(outcome, MergeOutcome::Discarded);
        assert!(engine.is_empty());
        assert_eq!(engine.cursor(), None);

        // Fresh state can fetch the first page again.
        let ticket = engine.begin_fetch().unwrap();
        assert_eq!(ticket.cursor(), None);
    }

    #[test]
    fn test_fetch_for_superseded_cursor_discarded() {
        let (_session, engine) = setup();
        engine.merge_page(page(&["1"], Some("c1")));

        let ticket = engine.begin_fetch().unwrap();
        engine.merge_page(page(&["2"], Some("c2")));

        let outcome = engine
            .complete_fetch(ticket, Ok(page(&["x"], Some("cx"))))
            .unwrap();
        assert_eq!(outcome, MergeOutcome::Discarded);
        assert_eq!(ids(&engine), vec!["1", "2"]);
        assert_eq!(engine.cursor(), Some(Cursor::new("c2")));
    }

    #[test]
    fn test_fetch_error_keeps_last_known_good() {
        let (_session, engine) = setup();
        let source = ScriptedSource::new()
            .page(None, page(&["1"], Some("c1")))
            .failing(Some("c1"), FetchError::Transport("connection reset".into()));

        engine.load_next_page(&source).unwrap();
        let before = engine.snapshot();

        let err = engine.load_next_page(&source).unwrap_err();
        assert!(matches!(err, EngineError::Fetch(FetchError::Transport(_))));
        assert_eq!(engine.snapshot(), before);
        assert!(!engine.is_fetching());
    }

    #[test]
    fn test_restamp_unlocks_and_relocks_without_fetch() {
        let (session, engine) = setup();
        engine.merge_page(FeedPage::new(vec![premium("1", true)], Some(Cursor::new("c1"))));

        let item = PostId::new("1");
        assert!(engine.get(&item).unwrap().access.is_locked());

        session.set_subscriptions(Some(SubscriptionSnapshot::platform(SubscriptionTier::Premium)));
        assert!(engine.get(&item).unwrap().access.is_full());

        session.set_subscriptions(Some(SubscriptionSnapshot::none()));
        assert!(engine.get(&item).unwrap().access.is_locked());
    }

    #[test]
    fn test_server_denial_pending_confirmation() {
        let (session, engine) = setup();
        engine.merge_page(FeedPage::new(vec![premium("1", false)], Some(Cursor::new("c1"))));
        assert!(engine.pending_confirmation().is_empty());

        session.set_subscriptions(Some(SubscriptionSnapshot::platform(SubscriptionTier::Premium)));
        let stamped = engine.get(&PostId::new("1")).unwrap();
        assert!(stamped.access.is_locked());
        assert_eq!(engine.pending_confirmation(), vec![PostId::new("1")]);

        // Server confirms on the next page.
        engine.merge_page(FeedPage::new(vec![premium("1", true)], None));
        assert!(engine.get(&PostId::new("1")).unwrap().access.is_full());
        assert!(engine.pending_confirmation().is_empty());
    }

    #[test]
    fn test_clear_auth_resets_feed() {
        let (session, engine) = setup();
        session.set_subscriptions(Some(SubscriptionSnapshot::platform(SubscriptionTier::Premium)));
        engine.merge_page(page(&["1", "2"], Some("c1")));
        engine.open_post(post("detail"));
        let generation = engine.generation();

        session.clear_auth();

        assert!(engine.is_empty());
        assert_eq!(engine.cursor(), None);
        assert!(!engine.is_exhausted());
        assert_eq!(engine.generation(), generation + 1);
        assert!(engine.cached_post(&PostId::new("detail")).is_none());
    }

    #[test]
    fn test_clear_auth_abandons_in_flight_fetch() {
        let (session, engine) = setup();
        let ticket = engine.begin_fetch().unwrap();

        session.clear_auth();

        let outcome = engine
            .complete_fetch(ticket, Ok(page(&["1"], Some("c1"))))
            .unwrap();
        assert_eq!(outcome, MergeOutcome::Discarded);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_local_insert_and_remove() {
        let (_session, engine) = setup();
        engine.merge_page(page(&["1", "2", "3"], Some("c1")));

        assert!(engine.add_local_post(post("new")));
        assert!(!engine.add_local_post(post("2")));
        assert_eq!(ids(&engine), vec!["new", "1", "2", "3"]);

        let removed = engine.remove_post(&PostId::new("2")).unwrap();
        assert_eq!(removed.id(), &PostId::new("2"));
        assert_eq!(ids(&engine), vec!["new", "1", "3"]);
        assert!(engine.remove_post(&PostId::new("2")).is_none());

        // Positions still resolve after the shifts.
        assert_eq!(engine.get(&PostId::new("3")).unwrap().id(), &PostId::new("3"));
        engine.merge_page(page(&["3"], Some("c2")));
        assert_eq!(ids(&engine), vec!["new", "1", "3"]);
    }

    #[test]
    fn test_cached_post_stamped_at_read_time() {
        let (session, engine) = setup();
        let opened = engine.open_post(premium("p", true));
        assert!(opened.access.is_locked());

        session.set_subscriptions(Some(SubscriptionSnapshot::platform(SubscriptionTier::Premium)));
        let cached = engine.cached_post(&PostId::new("p")).unwrap();
        assert!(cached.access.is_full());
    }

    #[test]
    fn test_events_published() {
        let (session, engine) = setup();
        let handle = engine.subscribe(EventConfig::default());

        engine.merge_page(FeedPage::new(vec![premium("1", true)], None));
        session.set_subscriptions(Some(SubscriptionSnapshot::platform(SubscriptionTier::Premium)));
        session.clear_auth();

        let events = handle.drain();
        assert_eq!(
            events,
            vec![
                FeedEvent::PageMerged {
                    generation: 0,
                    added: 1,
                    replaced: 0,
                    exhausted: true
                },
                FeedEvent::Restamped {
                    generation: 0,
                    unlocked: 1,
                    relocked: 0
                },
                FeedEvent::Reset { generation: 1 },
            ]
        );
    }
}
