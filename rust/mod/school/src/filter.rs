//! Student list filters and the debounce in front of them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use schoolerp_client::ListParams;

use crate::model::{Student, StudentStatus};

/// Class/section/status filters plus free-text search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentFilter {
    pub student_class: Option<i64>,
    pub section: Option<i64>,
    pub status: Option<StudentStatus>,
    pub search: String,
}

impl StudentFilter {
    pub fn is_empty(&self) -> bool {
        self.student_class.is_none()
            && self.section.is_none()
            && self.status.is_none()
            && self.search.trim().is_empty()
    }

    /// Query parameters for `GET students/`.
    pub fn to_params(&self, page: u32, page_size: u32) -> ListParams {
        let mut params = ListParams::new().page(page.max(1), page_size);
        if let Some(class) = self.student_class {
            params = params.filter("student_class", class);
        }
        if let Some(section) = self.section {
            params = params.filter("section", section);
        }
        if let Some(status) = self.status {
            params = params.filter("status", status.as_str());
        }
        params.filter("search", self.search.trim())
    }

    /// Same predicate as the server, for narrowing rows already fetched.
    pub fn matches(&self, s: &Student) -> bool {
        if self.student_class.is_some_and(|c| c != s.student_class) {
            return false;
        }
        if self.section.is_some_and(|c| c != s.section) {
            return false;
        }
        if self.status.is_some_and(|st| st != s.status) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let roll = s.roll_no.map(|r| r.to_string()).unwrap_or_default();
        [
            s.first_name.as_str(),
            s.last_name.as_str(),
            s.guardian_name.as_deref().unwrap_or(""),
            s.guardian_phone.as_deref().unwrap_or(""),
            roll.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
            || s.full_name().to_lowercase().contains(&needle)
    }
}

/// Trailing-edge debounce: only the last call within `delay` proceeds.
pub struct Debouncer {
    generation: AtomicU64,
    delay: Duration,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            generation: AtomicU64::new(0),
            delay,
        }
    }

    /// Wait out the delay. `true` when no newer call arrived meanwhile.
    pub async fn settle(&self) -> bool {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == mine
    }
}
