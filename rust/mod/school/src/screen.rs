//! Generic CRUD screen driver.
//!
//! A [`Screen`] describes what differs between screens: the form, how it
//! turns into a payload, list filters and messages. [`CrudScreen`] owns the
//! rest (permission checks, the confirm flow, the REST calls, notifications
//! and list refresh) and [`register_crud`] wires it into Flux.

use std::sync::Arc;

use schoolerp_client::{FilePart, ListParams, Resource, ResourceClient};
use schoolerp_flux::{Flux, StateStore};
use tracing::{debug, error, info, warn};

use crate::context::SchoolContext;
use crate::model::Entity;
use crate::notify;
use crate::permission::{self, Action, Capabilities, PermissionSet};
use crate::requests::{op, screen_path, state, DeleteReq, EditReq, UpdateFieldReq};
use crate::validate::ValidationError;
use crate::workflow::{ConfirmState, FlowCell, FlowError, Outcome, StagedAction};

/// Raw form input, one string per field the way the user typed it.
pub trait FormFields: Default + Clone + Send + Sync + 'static {
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError>;
}

/// Pending form values plus what is being edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState<F> {
    pub values: F,
    /// Id of the row being edited; `None` for a new row.
    pub editing: Option<i64>,
    /// Last validation or permission message.
    pub error: Option<String>,
}

/// Pagination info for the last list fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ListInfo {
    pub total: usize,
    pub has_next: bool,
}

#[derive(Debug, Clone)]
pub enum Mutation<E> {
    Create { item: E, files: Vec<FilePart> },
    Update { id: i64, item: E, files: Vec<FilePart> },
    Delete { id: i64 },
}

impl<E> Mutation<E> {
    pub fn action(&self) -> Action {
        match self {
            Mutation::Create { .. } => Action::Add,
            Mutation::Update { .. } => Action::Change,
            Mutation::Delete { .. } => Action::Delete,
        }
    }
}

impl<E: Entity> StagedAction for Mutation<E> {
    fn summary(&self) -> String {
        let label = E::KIND.label;
        match self {
            Mutation::Create { files, .. } if !files.is_empty() => {
                format!("Create {} with {} attachment(s)", label, files.len())
            }
            Mutation::Create { .. } => format!("Create {}", label),
            Mutation::Update { id, .. } => format!("Update {} #{}", label, id),
            Mutation::Delete { id } => format!("Delete {} #{}", label, id),
        }
    }
}

pub trait Screen: Send + Sync + 'static {
    type Entity: Entity;
    type Form: FormFields;

    /// Path prefix, e.g. `"sections"`.
    fn name(&self) -> &'static str;

    /// Turn the form into a payload. `existing` is the cached list, used
    /// for duplicate checks; `editing` is excluded from them.
    fn validate(
        &self,
        form: &Self::Form,
        existing: &[Self::Entity],
        editing: Option<i64>,
    ) -> Result<Self::Entity, ValidationError>;

    /// Checks against other cached lists, e.g. a mark against its maximum.
    fn cross_check(&self, _item: &Self::Entity, _store: &StateStore) -> Result<(), ValidationError> {
        Ok(())
    }

    fn to_form(&self, entity: &Self::Entity) -> Self::Form;

    /// Form after a successful create/update.
    fn reset(&self, _form: &Self::Form) -> Self::Form {
        Self::Form::default()
    }

    /// Files to send with the payload. Non-empty switches to multipart.
    fn files(&self, _form: &Self::Form) -> Vec<FilePart> {
        Vec::new()
    }

    fn list_params(&self, _ctx: &SchoolContext, _store: &StateStore) -> ListParams {
        ListParams::new()
    }

    fn success_message(&self, action: Action) -> String {
        let label = <Self::Entity as Entity>::KIND.label;
        let verb = match action {
            Action::Add => "created",
            Action::Change => "updated",
            Action::Delete => "deleted",
            Action::View => "loaded",
        };
        format!("{} {}", label, verb)
    }
}

/// Runtime of one screen: its flow and client, shared by its handlers.
pub struct CrudScreen<S: Screen> {
    screen: S,
    ctx: Arc<SchoolContext>,
    client: ResourceClient<S::Entity>,
    flow: FlowCell<Mutation<S::Entity>>,
    list_path: String,
    info_path: String,
    form_path: String,
}

impl<S: Screen> CrudScreen<S> {
    pub fn new(screen: S, ctx: Arc<SchoolContext>) -> Self {
        let name = screen.name();
        Self {
            client: ctx.client(),
            flow: FlowCell::new(screen_path(name, state::CONFIRM)),
            list_path: screen_path(name, state::LIST),
            info_path: screen_path(name, "list-info"),
            form_path: screen_path(name, state::FORM),
            screen,
            ctx,
        }
    }

    pub fn name(&self) -> &'static str {
        self.screen.name()
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn ctx(&self) -> &Arc<SchoolContext> {
        &self.ctx
    }

    pub fn client(&self) -> &ResourceClient<S::Entity> {
        &self.client
    }

    pub fn list_path(&self) -> &str {
        &self.list_path
    }

    pub fn form_path(&self) -> &str {
        &self.form_path
    }

    pub fn capabilities(&self, store: &StateStore) -> Capabilities {
        PermissionSet::current(store).capabilities(S::Entity::KIND)
    }

    pub fn list(&self, store: &StateStore) -> Vec<S::Entity> {
        store.get_as(&self.list_path).unwrap_or_default()
    }

    pub fn form(&self, store: &StateStore) -> FormState<S::Form> {
        store.get_as(&self.form_path).unwrap_or_default()
    }

    pub fn confirm_state(&self) -> ConfirmState {
        self.flow.snapshot()
    }

    /// Replace the form values, keeping `editing`.
    pub fn edit_form(&self, store: &StateStore, f: impl FnOnce(&mut S::Form)) {
        store.update::<FormState<S::Form>, _>(&self.form_path, |form| {
            f(&mut form.values);
            form.error = None;
        });
    }

    fn set_form_error(&self, store: &StateStore, message: String) {
        store.update::<FormState<S::Form>, _>(&self.form_path, |form| form.error = Some(message));
    }

    fn check(&self, store: &StateStore, action: Action) -> Result<(), FlowError> {
        permission::require(store, action, S::Entity::KIND).map_err(FlowError::PermissionDenied)
    }

    // ── list ──

    /// Handle `{name}/load`.
    pub async fn load(&self, store: &StateStore) {
        if let Err(code) = permission::require(store, Action::View, S::Entity::KIND) {
            store.fail_fetch(&self.list_path, format!("permission denied: {}", code));
            return;
        }
        let params = self.screen.list_params(&self.ctx, store);
        debug!(screen = self.name(), query = ?params.to_query(), "loading list");
        store.begin_fetch(&self.list_path);
        match self.client.list(&params).await {
            Ok(page) => {
                store.set(
                    &self.info_path,
                    ListInfo {
                        total: page.total,
                        has_next: page.has_next,
                    },
                );
                store.finish_fetch(&self.list_path, page.items);
            }
            Err(e) => {
                error!(screen = self.name(), error = %e, "list fetch failed");
                store.fail_fetch(&self.list_path, e.detail());
                let context = format!("Load {}", S::Entity::KIND.label);
                notify::api_error(store, &context, &e);
            }
        }
    }

    // ── form ──

    /// Handle `{name}/update-field`.
    pub fn update_field(&self, store: &StateStore, req: &UpdateFieldReq) -> Result<(), FlowError> {
        let mut result = Ok(());
        store.update::<FormState<S::Form>, _>(&self.form_path, |form| {
            match form.values.set_field(&req.field, &req.value) {
                Ok(()) => form.error = None,
                Err(e) => {
                    form.error = Some(e.to_string());
                    result = Err(FlowError::Invalid(e));
                }
            }
        });
        result
    }

    /// Handle `{name}/edit`: fill the form from the cached row, or fetch it.
    pub async fn edit(&self, store: &StateStore, id: i64) -> Result<(), FlowError> {
        self.check(store, Action::Change)?;
        let cached = self.list(store).into_iter().find(|e| e.id() == Some(id));
        let entity = match cached {
            Some(e) => e,
            None => match self.client.get(id).await {
                Ok(e) => e,
                Err(e) => {
                    error!(screen = self.name(), id, error = %e, "failed to load row");
                    let context = format!("Load {} #{}", S::Entity::KIND.label, id);
                    notify::api_error(store, &context, &e);
                    return Ok(());
                }
            },
        };
        store.set(
            &self.form_path,
            FormState {
                values: self.screen.to_form(&entity),
                editing: Some(id),
                error: None,
            },
        );
        Ok(())
    }

    /// Handle `{name}/reset`.
    pub fn reset(&self, store: &StateStore) {
        store.set(&self.form_path, FormState::<S::Form>::default());
    }

    // ── staging ──

    /// Handle `{name}/submit`: validate the form and stage a create or
    /// update.
    ///
    /// A rejected submit also drops anything staged by an earlier one.
    pub fn submit(&self, store: &StateStore) -> Result<(), FlowError> {
        self.prepare(store).inspect_err(|_| self.drop_stale(store))?;
        store.update::<FormState<S::Form>, _>(&self.form_path, |form| form.error = None);
        Ok(())
    }

    fn prepare(&self, store: &StateStore) -> Result<(), FlowError> {
        let form = self.form(store);
        let action = if form.editing.is_some() {
            Action::Change
        } else {
            Action::Add
        };
        self.check(store, action)?;

        let item = self
            .screen
            .validate(&form.values, &self.list(store), form.editing)
            .and_then(|item| self.screen.cross_check(&item, store).map(|()| item))
            .inspect_err(|e| warn!(screen = self.name(), error = %e, "validation failed"))?;
        let files = self.screen.files(&form.values);
        let mutation = match form.editing {
            Some(id) => Mutation::Update { id, item, files },
            None => Mutation::Create { item, files },
        };
        self.flow.stage(store, mutation)
    }

    fn drop_stale(&self, store: &StateStore) {
        if let Some(dropped) = self.flow.discard(store) {
            debug!(screen = self.name(), action = %dropped.summary(), "stale staged action dropped");
        }
    }

    /// Handle `{name}/delete`.
    pub fn delete(&self, store: &StateStore, id: i64) -> Result<(), FlowError> {
        self.check(store, Action::Delete)
            .inspect_err(|_| self.drop_stale(store))?;
        self.flow.stage(store, Mutation::Delete { id })
    }

    /// Handle `{name}/cancel`.
    pub fn cancel(&self, store: &StateStore) -> Result<(), FlowError> {
        if let Some(dropped) = self.flow.cancel(store)? {
            debug!(screen = self.name(), action = %dropped.summary(), "staged action cancelled");
        }
        Ok(())
    }

    /// Handle `{name}/confirm`: run the staged mutation.
    ///
    /// Success notifies, resets the form and invalidates the list. Failure
    /// notifies with the server's status and detail and leaves the form
    /// alone.
    pub async fn confirm(&self, store: &StateStore) -> Result<Outcome, FlowError> {
        let mutation = self.flow.start(store)?;
        let summary = mutation.summary();

        let result = match &mutation {
            Mutation::Create { item, files } if files.is_empty() => {
                self.client.create(item).await.map(|_| ())
            }
            Mutation::Create { item, files } => {
                self.client.create_multipart(item, files.clone()).await.map(|_| ())
            }
            Mutation::Update { id, item, files } if files.is_empty() => {
                self.client.update(*id, item).await.map(|_| ())
            }
            Mutation::Update { id, item, files } => self
                .client
                .update_multipart(*id, item, files.clone())
                .await
                .map(|_| ()),
            Mutation::Delete { id } => self.client.delete(*id).await,
        };

        match result {
            Ok(()) => {
                info!(screen = self.name(), action = %summary, "mutation succeeded");
                self.flow.settle(store, Outcome::Success);
                notify::success(store, self.screen.success_message(mutation.action()));
                self.after_success(store, &mutation);
                store.invalidate(&self.list_path);
                Ok(Outcome::Success)
            }
            Err(e) => {
                error!(screen = self.name(), action = %summary, error = %e, "mutation failed");
                self.flow.settle(store, Outcome::Error);
                notify::api_error(store, &summary, &e);
                Ok(Outcome::Error)
            }
        }
    }

    fn after_success(&self, store: &StateStore, mutation: &Mutation<S::Entity>) {
        let form = self.form(store);
        let reset = match mutation {
            Mutation::Create { .. } | Mutation::Update { .. } => true,
            Mutation::Delete { id } => form.editing == Some(*id),
        };
        if reset {
            store.set(
                &self.form_path,
                FormState {
                    values: self.screen.reset(&form.values),
                    editing: None,
                    error: None,
                },
            );
        }
    }

    /// Report a rejected request the way every screen does.
    pub fn report(&self, store: &StateStore, err: &FlowError) {
        warn!(screen = self.name(), error = %err, "request rejected");
        match err {
            FlowError::PermissionDenied(_) => {
                self.set_form_error(store, err.to_string());
                notify::warning(store, err.to_string());
            }
            FlowError::Invalid(_) => self.set_form_error(store, err.to_string()),
            FlowError::Busy => {
                notify::warning(store, err.to_string());
            }
            FlowError::NothingStaged | FlowError::NotConfirmed => {}
        }
    }
}

/// Register the standard handlers of `screen` and return its runtime so
/// screen-specific handlers can share it.
pub fn register_crud<S: Screen>(flux: &Flux, ctx: Arc<SchoolContext>, screen: S) -> Arc<CrudScreen<S>> {
    let rt = Arc::new(CrudScreen::new(screen, ctx));
    let name = rt.name();
    let store = flux.store();

    store.register_query(&rt.list_path, &screen_path(name, op::LOAD));
    store.set(&rt.form_path, FormState::<S::Form>::default());
    rt.flow.publish(store);

    {
        let rt = rt.clone();
        flux.on(&screen_path(name, op::LOAD), move |_, _, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                rt.load(&store).await;
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(&screen_path(name, op::UPDATE_FIELD), move |path, payload, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                let Some(req) = payload.downcast_ref::<UpdateFieldReq>() else {
                    warn!(%path, "unexpected payload");
                    return;
                };
                if let Err(e) = rt.update_field(&store, req) {
                    debug!(screen = rt.name(), error = %e, "field rejected");
                }
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(&screen_path(name, op::EDIT), move |path, payload, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                let Some(req) = payload.downcast_ref::<EditReq>() else {
                    warn!(%path, "unexpected payload");
                    return;
                };
                if let Err(e) = rt.edit(&store, req.id).await {
                    rt.report(&store, &e);
                }
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(&screen_path(name, op::RESET), move |_, _, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                rt.reset(&store);
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(&screen_path(name, op::SUBMIT), move |_, _, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                if let Err(e) = rt.submit(&store) {
                    rt.report(&store, &e);
                }
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(&screen_path(name, op::DELETE), move |path, payload, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                let Some(req) = payload.downcast_ref::<DeleteReq>() else {
                    warn!(%path, "unexpected payload");
                    return;
                };
                if let Err(e) = rt.delete(&store, req.id) {
                    rt.report(&store, &e);
                }
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(&screen_path(name, op::CONFIRM), move |_, _, store: Arc<StateStore>| {
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
        flux.on(&screen_path(name, op::CANCEL), move |_, _, store: Arc<StateStore>| {
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
