//! Query bookkeeping: loading/stale flags per cached path and the
//! refetch queue fed by invalidation.

use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};

use crate::trie::pattern_matches;

/// Fetch status of one cached path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStatus {
    /// Request path emitted to refetch this query.
    pub refetch: String,
    pub loading: bool,
    /// Set by invalidation, cleared by a successful fetch.
    pub stale: bool,
    pub error: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl QueryStatus {
    fn new(refetch: &str) -> Self {
        Self {
            refetch: refetch.to_string(),
            loading: false,
            stale: true,
            error: None,
            fetched_at: None,
        }
    }
}

#[derive(Default)]
pub(crate) struct QueryTable {
    entries: RwLock<BTreeMap<String, QueryStatus>>,
    pending: Mutex<Vec<String>>,
}

impl QueryTable {
    pub(crate) fn register(&self, key: &str, refetch: &str) {
        let mut entries = self.entries.write().unwrap();
        entries
            .entry(key.to_string())
            .and_modify(|s| s.refetch = refetch.to_string())
            .or_insert_with(|| QueryStatus::new(refetch));
    }

    pub(crate) fn begin(&self, key: &str) {
        self.with(key, |s| {
            s.loading = true;
            s.error = None;
        });
    }

    pub(crate) fn finish(&self, key: &str) {
        self.with(key, |s| {
            s.loading = false;
            s.stale = false;
            s.error = None;
            s.fetched_at = Some(Utc::now());
        });
    }

    pub(crate) fn fail(&self, key: &str, error: String) {
        self.with(key, |s| {
            s.loading = false;
            s.error = Some(error);
        });
    }

    pub(crate) fn status(&self, key: &str) -> Option<QueryStatus> {
        self.entries.read().unwrap().get(key).cloned()
    }

    pub(crate) fn any_loading(&self, keys: &[&str]) -> bool {
        let entries = self.entries.read().unwrap();
        keys.iter()
            .any(|k| entries.get(*k).is_some_and(|s| s.loading))
    }

    /// Mark every query matching `pattern` stale and queue its refetch.
    ///
    /// Returns the invalidated keys.
    pub(crate) fn invalidate(&self, pattern: &str) -> Vec<String> {
        let mut hit = Vec::new();
        let mut refetch = Vec::new();
        {
            let mut entries = self.entries.write().unwrap();
            for (key, status) in entries.iter_mut() {
                if pattern_matches(pattern, key) {
                    status.stale = true;
                    hit.push(key.clone());
                    refetch.push(status.refetch.clone());
                }
            }
        }
        let mut pending = self.pending.lock().unwrap();
        for path in refetch {
            if !pending.contains(&path) {
                pending.push(path);
            }
        }
        hit
    }

    pub(crate) fn take_pending(&self) -> Vec<String> {
        std::mem::take(&mut *self.pending.lock().unwrap())
    }

    fn with(&self, key: &str, f: impl FnOnce(&mut QueryStatus)) {
        let mut entries = self.entries.write().unwrap();
        if let Some(status) = entries.get_mut(key) {
            f(status);
        }
    }
}
