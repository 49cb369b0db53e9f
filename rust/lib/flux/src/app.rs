use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::query::QueryStatus;
use crate::router::{Payload, Router};
use crate::store::StateStore;
use crate::value::{StateValue, SubscriptionId};

/// Rounds of invalidation-triggered refetches drained per `emit`.
const MAX_REFETCH_ROUNDS: usize = 4;

/// The state engine a platform shell talks to.
///
/// - `get(path)` reads state
/// - `emit(path, payload)` sends a request to the matching handler(s)
/// - `subscribe(pattern)` observes state changes
///
/// Handlers may call `StateStore::invalidate`. The refetch requests it
/// queues are dispatched here, after the handler returns and before
/// `emit` resolves, so the shell never observes a settled mutation next to
/// a list that was not refreshed.
pub struct Flux {
    store: Arc<StateStore>,
    router: Router,
}

impl Flux {
    pub fn new() -> Self {
        Self {
            store: Arc::new(StateStore::new()),
            router: Router::new(),
        }
    }

    // ── state ──

    pub fn get(&self, path: &str) -> Option<StateValue> {
        self.store.get(path)
    }

    pub fn get_as<T: Any + Clone>(&self, path: &str) -> Option<T> {
        self.store.get_as(path)
    }

    pub fn scan(&self, prefix: &str) -> Vec<(String, StateValue)> {
        self.store.scan(prefix)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.store.contains(path)
    }

    pub fn query_status(&self, key: &str) -> Option<QueryStatus> {
        self.store.query_status(key)
    }

    // ── requests ──

    /// Dispatch a request and wait for its handlers and any refetches
    /// they caused.
    pub async fn emit<T: Any + Send + Sync>(&self, path: &str, payload: T) {
        self.emit_arc(path, Arc::new(payload)).await;
    }

    pub async fn emit_arc(&self, path: &str, payload: Payload) {
        let ran = self
            .router
            .dispatch(path, payload, Arc::clone(&self.store))
            .await;
        debug!(path, handlers = ran, "request dispatched");
        self.drain_refetches().await;
    }

    /// Invalidate matching queries and refetch them now.
    pub async fn invalidate(&self, pattern: &str) -> Vec<String> {
        let keys = self.store.invalidate(pattern);
        self.drain_refetches().await;
        keys
    }

    pub fn on<F, Fut>(&self, pattern: &str, handler: F)
    where
        F: Fn(String, Payload, Arc<StateStore>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.router.on(pattern, handler);
    }

    pub fn has_handler(&self, path: &str) -> bool {
        self.router.matches(path)
    }

    // ── subscriptions ──

    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&str, &StateValue) + Send + Sync + 'static,
    {
        self.store.subscribe(pattern, handler)
    }

    pub fn unsubscribe(&self, pattern: &str, id: SubscriptionId) {
        self.store.unsubscribe(pattern, id);
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    async fn drain_refetches(&self) {
        for _ in 0..MAX_REFETCH_ROUNDS {
            let pending = self.store.take_refetches();
            if pending.is_empty() {
                return;
            }
            for path in pending {
                debug!(path = %path, "refetch");
                self.router
                    .dispatch(&path, Arc::new(()), Arc::clone(&self.store))
                    .await;
            }
        }
        let left = self.store.take_refetches();
        if !left.is_empty() {
            warn!(?left, "refetch chain too deep, dropping");
        }
    }
}

impl Default for Flux {
    fn default() -> Self {
        Self::new()
    }
}
