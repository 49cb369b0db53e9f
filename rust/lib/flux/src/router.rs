use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::store::StateStore;
use crate::trie::Trie;

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Payload as handlers receive it; downcast to the request struct.
pub type Payload = Arc<dyn Any + Send + Sync>;

type ErasedHandler = Arc<dyn Fn(String, Payload, Arc<StateStore>) -> BoxFuture + Send + Sync>;

/// Maps request path patterns to async handlers.
///
/// Every handler whose pattern matches runs, in registration order, one
/// after another. An unmatched path is a no-op.
pub struct Router {
    trie: Trie<ErasedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self { trie: Trie::new() }
    }

    pub fn on<F, Fut>(&self, pattern: &str, handler: F)
    where
        F: Fn(String, Payload, Arc<StateStore>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: ErasedHandler =
            Arc::new(move |path, payload, store| -> BoxFuture { Box::pin(handler(path, payload, store)) });
        self.trie.insert(pattern, handler);
    }

    /// Run all handlers matching `path`. Returns how many ran.
    pub async fn dispatch(&self, path: &str, payload: Payload, store: Arc<StateStore>) -> usize {
        let handlers = self.trie.match_topic(path);
        let count = handlers.len();
        for handler in handlers {
            handler(path.to_string(), Arc::clone(&payload), Arc::clone(&store)).await;
        }
        count
    }

    pub fn has_handler(&self, pattern: &str) -> bool {
        self.trie.has_pattern(pattern)
    }

    pub fn matches(&self, path: &str) -> bool {
        !self.trie.match_topic(path).is_empty()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct EditReq {
        id: i64,
    }

    #[tokio::test]
    async fn typed_payload_reaches_handler() {
        let router = Router::new();
        router.on("classes/edit", |_, payload, store: Arc<StateStore>| async move {
            if let Some(req) = payload.downcast_ref::<EditReq>() {
                store.set("classes/editing", req.id);
            }
        });

        let store = Arc::new(StateStore::new());
        let ran = router
            .dispatch("classes/edit", Arc::new(EditReq { id: 4 }), Arc::clone(&store))
            .await;

        assert_eq!(ran, 1);
        assert_eq!(store.get_as::<i64>("classes/editing"), Some(4));
    }

    #[tokio::test]
    async fn unmatched_path_is_noop() {
        let router = Router::new();
        router.on("classes/edit", |_, _, _| async {});
        let ran = router
            .dispatch("sections/edit", Arc::new(()), Arc::new(StateStore::new()))
            .await;
        assert_eq!(ran, 0);
    }

    #[tokio::test]
    async fn wildcard_handlers_run_in_order() {
        let router = Router::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for (pattern, tag) in [("notices/submit", "exact"), ("+/submit", "single"), ("#", "all")] {
            let order = order.clone();
            router.on(pattern, move |path, _, _| {
                let order = order.clone();
                async move { order.lock().unwrap().push(format!("{tag}:{path}")) }
            });
        }

        router
            .dispatch("notices/submit", Arc::new(()), Arc::new(StateStore::new()))
            .await;

        let order = order.lock().unwrap();
        assert_eq!(order.len(), 3);
        assert!(order.contains(&"exact:notices/submit".to_string()));
        assert!(order.contains(&"single:notices/submit".to_string()));
        assert!(order.contains(&"all:notices/submit".to_string()));
    }

    #[test]
    fn has_handler_vs_matches() {
        let router = Router::new();
        router.on("+/load", |_, _, _| async {});

        assert!(router.has_handler("+/load"));
        assert!(!router.has_handler("classes/load"));
        assert!(router.matches("classes/load"));
        assert!(!router.matches("classes/submit"));
    }
}
