//! Toast-style notifications at `app/notifications`.

use std::sync::atomic::{AtomicU64, Ordering};

use schoolerp_client::ApiError;
use schoolerp_flux::StateStore;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub level: Level,
    pub message: String,
    /// HTTP status for server failures.
    pub status: Option<u16>,
}

impl Notification {
    pub const PATH: &'static str = "app/notifications";
}

pub fn push(store: &StateStore, level: Level, message: impl Into<String>, status: Option<u16>) -> u64 {
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let note = Notification {
        id,
        level,
        message: message.into(),
        status,
    };
    store.update::<Vec<Notification>, _>(Notification::PATH, |all| all.push(note));
    id
}

pub fn success(store: &StateStore, message: impl Into<String>) -> u64 {
    push(store, Level::Success, message, None)
}

pub fn warning(store: &StateStore, message: impl Into<String>) -> u64 {
    push(store, Level::Warning, message, None)
}

/// `"{status}: {detail}"` for server errors, the error text otherwise.
pub fn api_error(store: &StateStore, context: &str, err: &ApiError) -> u64 {
    let status = err.status();
    let message = match status {
        Some(code) => format!("{} failed. {}: {}", context, code, err.detail()),
        None => format!("{} failed. {}", context, err.detail()),
    };
    push(store, Level::Error, message, status)
}

pub fn dismiss(store: &StateStore, id: u64) {
    store.update::<Vec<Notification>, _>(Notification::PATH, |all| all.retain(|n| n.id != id));
}

pub fn all(store: &StateStore) -> Vec<Notification> {
    store.get_as(Notification::PATH).unwrap_or_default()
}
