//! Headless state engine for the school admin screens.
//!
//! All screen state lives in a flat path namespace (`classes/list`,
//! `classes/form`, `auth/permissions`). A platform shell renders it and
//! forwards user intents as requests.
//!
//! - `get(path)`: read state (`Arc` clone)
//! - `emit(path, payload)`: send a request to the matching handler(s)
//! - `subscribe(pattern)`: observe changes
//!
//! List paths can be registered as queries. A query tracks loading/stale
//! flags and names the request that refetches it, so a mutation handler
//! only has to `invalidate` the lists it touched.
//!
//! Patterns use MQTT-style wildcards: `+` for one level, `#` for the rest.

pub mod app;
pub mod query;
pub mod router;
pub mod store;
pub mod trie;
pub mod value;

pub use app::Flux;
pub use query::QueryStatus;
pub use router::{BoxFuture, Payload, Router};
pub use store::{ChangeHandler, StateStore};
pub use value::{StateValue, SubscriptionId};
