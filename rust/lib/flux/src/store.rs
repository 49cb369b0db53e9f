use std::any::Any;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::query::{QueryStatus, QueryTable};
use crate::trie::Trie;
use crate::value::{StateValue, SubscriptionId};

/// Callback for state change notifications.
pub type ChangeHandler = Arc<dyn Fn(&str, &StateValue) + Send + Sync>;

/// Path-keyed state with change subscriptions and query bookkeeping.
///
/// Values live in a `BTreeMap` so `scan` can walk a prefix in order.
/// Cached list paths are additionally registered as queries: they carry
/// loading/stale flags and a refetch request that `invalidate` queues.
pub struct StateStore {
    values: RwLock<BTreeMap<String, StateValue>>,
    handlers: Trie<HandlerEntry>,
    queries: QueryTable,
    next_id: AtomicU64,
}

#[derive(Clone)]
struct HandlerEntry {
    id: SubscriptionId,
    handler: ChangeHandler,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            handlers: Trie::new(),
            queries: QueryTable::default(),
            next_id: AtomicU64::new(1),
        }
    }

    // ── values ──

    /// Store `value` at `path` and notify matching subscribers.
    pub fn set<T: Any + Send + Sync>(&self, path: &str, value: T) {
        self.set_value(path, StateValue::new(value));
    }

    pub fn set_value(&self, path: &str, value: StateValue) {
        self.values
            .write()
            .unwrap()
            .insert(path.to_string(), value.clone());
        self.notify(path, &value);
    }

    fn notify(&self, path: &str, value: &StateValue) {
        for entry in self.handlers.match_topic(path) {
            (entry.handler)(path, value);
        }
    }

    pub fn get(&self, path: &str) -> Option<StateValue> {
        self.values.read().unwrap().get(path).cloned()
    }

    /// Typed read: clone the `T` stored at `path`.
    pub fn get_as<T: Any + Clone>(&self, path: &str) -> Option<T> {
        self.get(path).and_then(|v| v.cloned::<T>())
    }

    /// Read-modify-write of a typed value.
    ///
    /// Starts from `T::default()` when nothing (or another type) is stored.
    /// `f` runs under the write lock and must not touch the store;
    /// subscribers are called after the lock is released.
    pub fn update<T, F>(&self, path: &str, f: F) -> T
    where
        T: Any + Clone + Default + Send + Sync,
        F: FnOnce(&mut T),
    {
        let (current, value) = {
            let mut values = self.values.write().unwrap();
            let mut current = values
                .get(path)
                .and_then(|v| v.cloned::<T>())
                .unwrap_or_default();
            f(&mut current);
            let value = StateValue::new(current.clone());
            values.insert(path.to_string(), value.clone());
            (current, value)
        };
        self.notify(path, &value);
        current
    }

    /// Remove the value at `path`. Subscribers are not notified.
    pub fn remove(&self, path: &str) -> Option<StateValue> {
        self.values.write().unwrap().remove(path)
    }

    /// Entries strictly below `prefix`, ordered by path.
    pub fn scan(&self, prefix: &str) -> Vec<(String, StateValue)> {
        let values = self.values.read().unwrap();
        let start = format!("{}/", prefix);
        values
            .range(start.clone()..)
            .take_while(|(k, _)| k.starts_with(&start))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.values.read().unwrap().contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.values.read().unwrap().keys().cloned().collect()
    }

    // ── subscriptions ──

    /// Call `handler` synchronously on every `set` whose path matches `pattern`.
    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&str, &StateValue) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.insert(
            pattern,
            HandlerEntry {
                id,
                handler: Arc::new(handler),
            },
        );
        id
    }

    pub fn unsubscribe(&self, pattern: &str, id: SubscriptionId) {
        self.handlers.remove(pattern, |entry| entry.id == id);
    }

    // ── queries ──

    /// Declare `key` as a cached query refreshed by emitting `refetch`.
    pub fn register_query(&self, key: &str, refetch: &str) {
        self.queries.register(key, refetch);
    }

    pub fn begin_fetch(&self, key: &str) {
        self.queries.begin(key);
    }

    /// Store fetched data and clear the loading/stale flags.
    pub fn finish_fetch<T: Any + Send + Sync>(&self, key: &str, value: T) {
        self.queries.finish(key);
        self.set(key, value);
    }

    /// Record a failed fetch. Previously cached data stays in place.
    pub fn fail_fetch(&self, key: &str, error: impl Into<String>) {
        self.queries.fail(key, error.into());
    }

    pub fn query_status(&self, key: &str) -> Option<QueryStatus> {
        self.queries.status(key)
    }

    /// OR of the loading flags of `keys`.
    pub fn any_loading(&self, keys: &[&str]) -> bool {
        self.queries.any_loading(keys)
    }

    /// Mark matching queries stale and queue their refetch requests.
    ///
    /// The queued requests are dispatched by `Flux::emit` once the current
    /// handlers return.
    pub fn invalidate(&self, pattern: &str) -> Vec<String> {
        self.queries.invalidate(pattern)
    }

    pub(crate) fn take_refetches(&self) -> Vec<String> {
        self.queries.take_pending()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct SectionForm {
        name: String,
        error: Option<String>,
    }

    #[test]
    fn set_then_get_typed() {
        let store = StateStore::new();
        store.set("sections/form", SectionForm { name: "A".into(), error: None });

        let form: SectionForm = store.get_as("sections/form").unwrap();
        assert_eq!(form.name, "A");
        assert!(store.get_as::<String>("sections/form").is_none());
        assert!(store.get("sections/list").is_none());
    }

    #[test]
    fn update_starts_from_default() {
        let store = StateStore::new();
        let form = store.update("sections/form", |f: &mut SectionForm| f.name = "B".into());
        assert_eq!(form.name, "B");

        store.update("sections/form", |f: &mut SectionForm| f.error = Some("taken".into()));
        let form: SectionForm = store.get_as("sections/form").unwrap();
        assert_eq!(form, SectionForm { name: "B".into(), error: Some("taken".into()) });
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let store = Arc::new(StateStore::new());
        let seen = Arc::new(AtomicU64::new(0));
        let counter = seen.clone();
        store.subscribe("notifications", move |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        std::thread::scope(|s| {
            for t in 0..8u32 {
                let store = &store;
                s.spawn(move || {
                    for i in 0..250 {
                        store.update("notifications", |all: &mut Vec<u32>| all.push(t * 1000 + i));
                    }
                });
            }
        });

        let all: Vec<u32> = store.get_as("notifications").unwrap();
        assert_eq!(all.len(), 2000);
        assert_eq!(seen.load(Ordering::Relaxed), 2000);
    }

    #[test]
    fn scan_lists_children_only() {
        let store = StateStore::new();
        store.set("students", 0u8);
        store.set("students/list", 1u8);
        store.set("students/upload/confirm", 2u8);
        store.set("studentsx/list", 3u8);

        let paths: Vec<String> = store.scan("students").into_iter().map(|(k, _)| k).collect();
        assert_eq!(paths, vec!["students/list", "students/upload/confirm"]);
    }

    #[test]
    fn remove_does_not_notify() {
        let store = StateStore::new();
        let hits = Arc::new(Mutex::new(0));
        let h = hits.clone();
        store.subscribe("#", move |_, _| *h.lock().unwrap() += 1);

        store.set("classes/form", 1u8);
        assert!(store.remove("classes/form").is_some());
        assert!(!store.contains("classes/form"));
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn subscribers_see_matching_paths() {
        let store = StateStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let id = store.subscribe("+/list", move |path, _| s.lock().unwrap().push(path.to_string()));

        store.set("classes/list", 1u8);
        store.set("classes/form", 1u8);
        store.set("notices/list", 1u8);
        store.unsubscribe("+/list", id);
        store.set("sections/list", 1u8);

        assert_eq!(*seen.lock().unwrap(), vec!["classes/list", "notices/list"]);
    }

    #[test]
    fn failed_fetch_keeps_cached_data() {
        let store = StateStore::new();
        store.register_query("classes/list", "classes/load");
        store.begin_fetch("classes/list");
        store.finish_fetch("classes/list", vec![1i64, 2]);

        store.begin_fetch("classes/list");
        store.fail_fetch("classes/list", "network: refused");

        assert_eq!(store.get_as::<Vec<i64>>("classes/list"), Some(vec![1, 2]));
        let status = store.query_status("classes/list").unwrap();
        assert_eq!(status.error.as_deref(), Some("network: refused"));
        assert!(!store.any_loading(&["classes/list"]));
    }

    #[test]
    fn invalidate_queues_refetch() {
        let store = StateStore::new();
        store.register_query("sections/list", "sections/load");
        store.finish_fetch("sections/list", Vec::<i64>::new());

        assert_eq!(store.invalidate("sections/list"), vec!["sections/list".to_string()]);
        assert!(store.query_status("sections/list").unwrap().stale);
        assert_eq!(store.take_refetches(), vec!["sections/load".to_string()]);
    }
}
