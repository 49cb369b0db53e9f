//! Class-subject membership sync.
//!
//! Saving the subject checklist of a class is planned as one delete per
//! deselected membership row and one create per newly selected subject.
//! All calls are issued together and awaited as one batch; any failure
//! fails the batch.

use std::collections::BTreeSet;

use futures::future::{self, BoxFuture, FutureExt};
use schoolerp_client::{ApiError, ResourceClient};
use tracing::{debug, warn};

use crate::model::ClassSubject;
use crate::workflow::StagedAction;

#[derive(Debug, Clone, PartialEq)]
pub struct SyncPlan {
    pub class_id: i64,
    /// Membership row ids to delete.
    pub deletes: Vec<i64>,
    pub creates: Vec<ClassSubject>,
}

impl SyncPlan {
    /// Diff the stored rows of `class_id` against the wanted subject ids.
    pub fn diff(class_id: i64, rows: &[ClassSubject], selected: &BTreeSet<i64>) -> Self {
        let rows: Vec<&ClassSubject> = rows.iter().filter(|r| r.student_class == class_id).collect();
        let deletes = rows
            .iter()
            .filter(|r| !selected.contains(&r.subject))
            .filter_map(|r| r.id)
            .collect();
        let present: BTreeSet<i64> = rows.iter().map(|r| r.subject).collect();
        let creates = selected
            .iter()
            .filter(|s| !present.contains(s))
            .map(|&subject| ClassSubject {
                id: None,
                student_class: class_id,
                subject,
            })
            .collect();
        Self {
            class_id,
            deletes,
            creates,
        }
    }

    pub fn len(&self) -> usize {
        self.deletes.len() + self.creates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StagedAction for SyncPlan {
    fn summary(&self) -> String {
        format!(
            "Update subjects of class #{}: add {}, remove {}",
            self.class_id,
            self.creates.len(),
            self.deletes.len()
        )
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{failed} of {total} changes failed, first error: {first}")]
pub struct BatchError {
    pub failed: usize,
    pub total: usize,
    pub first: ApiError,
}

/// Run every call of `plan` concurrently. Returns the number of calls.
pub async fn execute(client: &ResourceClient<ClassSubject>, plan: &SyncPlan) -> Result<usize, BatchError> {
    let mut calls: Vec<BoxFuture<'_, Result<(), ApiError>>> = Vec::with_capacity(plan.len());
    for &id in &plan.deletes {
        calls.push(client.delete(id).boxed());
    }
    for row in &plan.creates {
        calls.push(client.create(row).map(|r| r.map(|_| ())).boxed());
    }

    let total = calls.len();
    debug!(class = plan.class_id, total, "syncing class subjects");
    let results = future::join_all(calls).await;

    let mut errors = results.into_iter().filter_map(Result::err);
    match errors.next() {
        None => Ok(total),
        Some(first) => {
            let failed = 1 + errors.count();
            warn!(class = plan.class_id, failed, total, "class subject sync failed");
            Err(BatchError { failed, total, first })
        }
    }
}
