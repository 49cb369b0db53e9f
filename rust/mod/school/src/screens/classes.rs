//! Classes screen: the name CRUD plus the subject checklist of a class.

use std::collections::BTreeSet;
use std::sync::Arc;

use schoolerp_client::{ListParams, ResourceClient};
use schoolerp_flux::{Flux, StateStore};
use tracing::{debug, error, info, warn};

use crate::batch::{self, SyncPlan};
use crate::context::SchoolContext;
use crate::model::{ClassSubject, Entity};
use crate::notify;
use crate::permission::{self, Action};
use crate::screen::{register_crud, CrudScreen};
use crate::screens::ClassScreen;
use crate::workflow::{FlowCell, FlowError, Outcome, StagedAction};

pub const SUBJECTS: &str = "classes/subjects";
pub const SUBJECTS_CONFIRM: &str = "classes/subjects-confirm";

pub const SELECT_CLASS: &str = "classes/select-class";
pub const TOGGLE_SUBJECT: &str = "classes/toggle-subject";
pub const SAVE_SUBJECTS: &str = "classes/save-subjects";
pub const CONFIRM_SUBJECTS: &str = "classes/confirm-subjects";
pub const CANCEL_SUBJECTS: &str = "classes/cancel-subjects";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectClassReq {
    pub class_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToggleSubjectReq {
    pub subject: i64,
}

/// Subject checklist of the selected class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassSubjectsState {
    pub class_id: Option<i64>,
    /// Membership rows as stored on the server.
    pub rows: Vec<ClassSubject>,
    /// Subject ids currently ticked.
    pub selected: BTreeSet<i64>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct ClassesRuntime {
    pub crud: Arc<CrudScreen<ClassScreen>>,
    members: ResourceClient<ClassSubject>,
    flow: FlowCell<SyncPlan>,
}

impl ClassesRuntime {
    fn state(store: &StateStore) -> ClassSubjectsState {
        store.get_as(SUBJECTS).unwrap_or_default()
    }

    /// Handle `classes/select-class`: load the class's membership rows.
    pub async fn select(&self, store: &StateStore, class_id: i64) {
        if let Err(code) = permission::require(store, Action::View, ClassSubject::KIND) {
            warn!(class = class_id, %code, "class subjects not loaded: permission denied");
            store.set(
                SUBJECTS,
                ClassSubjectsState {
                    class_id: Some(class_id),
                    error: Some(FlowError::PermissionDenied(code).to_string()),
                    ..Default::default()
                },
            );
            return;
        }

        store.update::<ClassSubjectsState, _>(SUBJECTS, |s| {
            s.class_id = Some(class_id);
            s.loading = true;
            s.error = None;
        });

        let params = ListParams::new().filter("student_class", class_id);
        match self.members.list(&params).await {
            Ok(page) => {
                let rows: Vec<ClassSubject> = page
                    .items
                    .into_iter()
                    .filter(|r| r.student_class == class_id)
                    .collect();
                store.set(
                    SUBJECTS,
                    ClassSubjectsState {
                        class_id: Some(class_id),
                        selected: rows.iter().map(|r| r.subject).collect(),
                        rows,
                        loading: false,
                        error: None,
                    },
                );
            }
            Err(e) => {
                error!(class = class_id, error = %e, "failed to load class subjects");
                store.update::<ClassSubjectsState, _>(SUBJECTS, |s| {
                    s.loading = false;
                    s.error = Some(e.detail());
                });
                notify::api_error(store, "Load class subjects", &e);
            }
        }
    }

    /// Handle `classes/toggle-subject`.
    pub fn toggle(&self, store: &StateStore, subject: i64) {
        store.update::<ClassSubjectsState, _>(SUBJECTS, |s| {
            if !s.selected.remove(&subject) {
                s.selected.insert(subject);
            }
        });
    }

    /// Handle `classes/save-subjects`: stage the diff. An unchanged
    /// checklist stages nothing, and like any rejected save it drops a
    /// plan staged earlier.
    pub fn save(&self, store: &StateStore) -> Result<Option<SyncPlan>, FlowError> {
        let staged = self.plan(store).and_then(|plan| match plan {
            Some(plan) => self.flow.stage(store, plan.clone()).map(|()| Some(plan)),
            None => Ok(None),
        });
        if !matches!(staged, Ok(Some(_))) {
            if let Some(dropped) = self.flow.discard(store) {
                debug!(action = %dropped.summary(), "stale subject plan dropped");
            }
        }
        staged
    }

    fn plan(&self, store: &StateStore) -> Result<Option<SyncPlan>, FlowError> {
        let state = Self::state(store);
        let Some(class_id) = state.class_id else {
            return Err(FlowError::NothingStaged);
        };
        let plan = SyncPlan::diff(class_id, &state.rows, &state.selected);
        if plan.is_empty() {
            notify::push(store, notify::Level::Info, "No subject changes to save", None);
            return Ok(None);
        }
        if !plan.deletes.is_empty() {
            permission::require(store, Action::Delete, ClassSubject::KIND).map_err(FlowError::PermissionDenied)?;
        }
        if !plan.creates.is_empty() {
            permission::require(store, Action::Add, ClassSubject::KIND).map_err(FlowError::PermissionDenied)?;
        }
        Ok(Some(plan))
    }

    /// Handle `classes/confirm-subjects`.
    pub async fn confirm(&self, store: &StateStore) -> Result<Outcome, FlowError> {
        let plan = self.flow.start(store)?;
        match batch::execute(&self.members, &plan).await {
            Ok(total) => {
                info!(class = plan.class_id, total, "class subjects saved");
                self.flow.settle(store, Outcome::Success);
                notify::success(store, "Class subjects updated");
                self.select(store, plan.class_id).await;
                Ok(Outcome::Success)
            }
            Err(e) => {
                error!(class = plan.class_id, error = %e, "class subjects not saved");
                self.flow.settle(store, Outcome::Error);
                let message = match e.first.status() {
                    Some(status) => format!("{} ({}: {})", e, status, e.first.detail()),
                    None => e.to_string(),
                };
                notify::push(store, notify::Level::Error, message, e.first.status());
                // Some calls may have landed.
                self.select(store, plan.class_id).await;
                Ok(Outcome::Error)
            }
        }
    }

    /// Handle `classes/cancel-subjects`.
    pub fn cancel(&self, store: &StateStore) -> Result<(), FlowError> {
        self.flow.cancel(store).map(|_| ())
    }

    fn report(&self, store: &StateStore, err: &FlowError) {
        warn!(error = %err, "class subjects request rejected");
        match err {
            FlowError::PermissionDenied(_) | FlowError::Busy => {
                notify::warning(store, err.to_string());
            }
            _ => {
                store.update::<ClassSubjectsState, _>(SUBJECTS, |s| s.error = Some(err.to_string()));
            }
        }
    }
}

pub fn register(flux: &Flux, ctx: Arc<SchoolContext>) -> Arc<ClassesRuntime> {
    let crud = register_crud(flux, ctx.clone(), ClassScreen::new("classes"));
    let rt = Arc::new(ClassesRuntime {
        crud,
        members: ctx.client(),
        flow: FlowCell::new(SUBJECTS_CONFIRM),
    });
    flux.store().set(SUBJECTS, ClassSubjectsState::default());
    rt.flow.publish(flux.store());

    {
        let rt = rt.clone();
        flux.on(SELECT_CLASS, move |path, payload, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                let Some(req) = payload.downcast_ref::<SelectClassReq>() else {
                    warn!(%path, "unexpected payload");
                    return;
                };
                rt.select(&store, req.class_id).await;
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(TOGGLE_SUBJECT, move |path, payload, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                let Some(req) = payload.downcast_ref::<ToggleSubjectReq>() else {
                    warn!(%path, "unexpected payload");
                    return;
                };
                rt.toggle(&store, req.subject);
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(SAVE_SUBJECTS, move |_, _, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                if let Err(e) = rt.save(&store) {
                    rt.report(&store, &e);
                }
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(CONFIRM_SUBJECTS, move |_, _, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                if let Err(e) = rt.confirm(&store).await {
                    rt.report(&store, &e);
                }
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(CANCEL_SUBJECTS, move |_, _, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                if let Err(e) = rt.cancel(&store) {
                    rt.report(&store, &e);
                }
            }
        });
    }

    rt
}
