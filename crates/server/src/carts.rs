//! Per-shopper cart sessions: the cart itself, the catalog snapshot taken
//! when the session opened, and the debounced recommendation runner.
//!
//! Sessions expire after sitting idle and the registry holds at most
//! `max_sessions` of them; opening one more retires the least recently used.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use aislefinder_core::config::ServerConfig;
use aislefinder_core::{
    CartEntry, CartHandle, CartStore, Catalog, RecommendationDebouncer, RecommendationEngine,
    RecommendationSet, SuggestionProvider,
};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

pub type SharedSuggestions = Arc<dyn SuggestionProvider>;

const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CartLimits {
    pub idle_timeout: Duration,
    pub max_sessions: usize,
}

impl From<&ServerConfig> for CartLimits {
    fn from(server: &ServerConfig) -> Self {
        Self { idle_timeout: server.cart_idle_timeout(), max_sessions: server.max_cart_sessions }
    }
}

struct CartSession {
    cart: CartHandle,
    catalog: Arc<Catalog>,
    debouncer: RecommendationDebouncer<SharedSuggestions>,
    last_active: Instant,
}

impl CartSession {
    fn is_idle(&self, now: Instant, idle_timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_active) >= idle_timeout
    }

    /// Cancels any pending recommendation run. Returns whether one was pending.
    fn retire(mut self, cart_id: Uuid, reason: &'static str) -> bool {
        let cancelled = self.debouncer.cancel();
        info!(
            event_name = "server.cart.closed",
            cart_id = %cart_id,
            reason,
            items = self.cart.len(),
            cancelled_pending = cancelled,
            "cart session closed"
        );
        cancelled
    }
}

pub struct CartSessions {
    engine: Arc<RecommendationEngine<SharedSuggestions>>,
    debounce: Duration,
    limits: CartLimits,
    sessions: Mutex<HashMap<Uuid, CartSession>>,
}

impl CartSessions {
    pub fn new(
        engine: RecommendationEngine<SharedSuggestions>,
        debounce: Duration,
        limits: CartLimits,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            debounce,
            limits,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn limits(&self) -> CartLimits {
        self.limits
    }

    pub fn open(&self, catalog: Catalog) -> Uuid {
        let now = Instant::now();
        let mut sessions = self.lock();
        self.evict_idle(&mut sessions, now);

        while sessions.len() >= self.limits.max_sessions.max(1) {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, session)| session.last_active)
                .map(|(cart_id, _)| *cart_id);
            let Some(oldest) = oldest else {
                break;
            };
            if let Some(session) = sessions.remove(&oldest) {
                session.retire(oldest, "capacity");
            }
        }

        let cart_id = Uuid::new_v4();
        sessions.insert(
            cart_id,
            CartSession {
                cart: CartStore::shared(),
                catalog: Arc::new(catalog),
                debouncer: RecommendationDebouncer::new(Arc::clone(&self.engine), self.debounce),
                last_active: now,
            },
        );

        info!(
            event_name = "server.cart.opened",
            cart_id = %cart_id,
            open_sessions = sessions.len(),
            "cart session opened"
        );
        cart_id
    }

    /// Appends `entry` and restarts the recommendation countdown with it as the
    /// most recent item. Returns the new cart length, or `None` for an unknown
    /// or expired cart.
    pub fn add(&self, cart_id: Uuid, entry: CartEntry) -> Option<usize> {
        let len = self.with_live(cart_id, |session| {
            let len = session.cart.add(entry.clone());
            session.debouncer.trigger(entry, Arc::clone(&session.catalog));
            len
        })?;

        debug!(event_name = "server.cart.item_added", cart_id = %cart_id, items = len);
        Some(len)
    }

    pub fn entries(&self, cart_id: Uuid) -> Option<Vec<CartEntry>> {
        self.with_live(cart_id, |session| session.cart.list())
    }

    /// Latest published recommendations plus the session's catalog snapshot.
    pub fn recommendations(&self, cart_id: Uuid) -> Option<(RecommendationSet, Arc<Catalog>)> {
        self.with_live(cart_id, |session| {
            (session.debouncer.latest(), Arc::clone(&session.catalog))
        })
    }

    #[cfg(test)]
    pub fn subscribe(
        &self,
        cart_id: Uuid,
    ) -> Option<tokio::sync::watch::Receiver<RecommendationSet>> {
        self.with_live(cart_id, |session| session.debouncer.subscribe())
    }

    /// Removes the session. Returns whether a recommendation run was still
    /// pending and got cancelled, or `None` for an unknown cart.
    pub fn close(&self, cart_id: Uuid) -> Option<bool> {
        let session = self.lock().remove(&cart_id)?;
        Some(session.retire(cart_id, "closed"))
    }

    pub fn open_count(&self) -> usize {
        self.lock().len()
    }

    /// Retires every session idle for longer than the configured timeout.
    pub fn sweep_idle(&self) -> usize {
        let mut sessions = self.lock();
        self.evict_idle(&mut sessions, Instant::now())
    }

    /// Runs [`Self::sweep_idle`] on an interval until the registry is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        let period = (self.limits.idle_timeout / 2).max(MIN_SWEEP_PERIOD);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                let evicted = registry.sweep_idle();
                if evicted > 0 {
                    debug!(event_name = "server.cart.swept", evicted, "idle cart sessions swept");
                }
            }
        })
    }

    fn with_live<T>(&self, cart_id: Uuid, f: impl FnOnce(&mut CartSession) -> T) -> Option<T> {
        let now = Instant::now();
        let mut sessions = self.lock();
        let idle = sessions.get(&cart_id)?.is_idle(now, self.limits.idle_timeout);
        if idle {
            if let Some(session) = sessions.remove(&cart_id) {
                session.retire(cart_id, "idle");
            }
            return None;
        }

        let session = sessions.get_mut(&cart_id)?;
        session.last_active = now;
        Some(f(session))
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, CartSession>, now: Instant) -> usize {
        let idle = sessions
            .iter()
            .filter(|(_, session)| session.is_idle(now, self.limits.idle_timeout))
            .map(|(cart_id, _)| *cart_id)
            .collect::<Vec<_>>();
        for cart_id in &idle {
            if let Some(session) = sessions.remove(cart_id) {
                session.retire(*cart_id, "idle");
            }
        }
        idle.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, CartSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
