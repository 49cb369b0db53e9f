//! School administration screens on top of the flux state engine.
//!
//! Every screen follows the same gated workflow: the signed-in group's
//! permissions decide what may be requested, form input is kept locally,
//! each mutation is staged and needs an explicit confirm, and a settled
//! mutation notifies the user and refetches the lists it touched.
//!
//! ```ignore
//! let admin = SchoolAdmin::from_config(&ClientConfig::default_path())?;
//! admin.emit(requests::INITIALIZE, ()).await;
//! admin.emit("sections/update-field", UpdateFieldReq::new("name", "A")).await;
//! admin.emit("sections/submit", ()).await;
//! admin.emit("sections/confirm", ()).await;
//! ```

pub mod batch;
pub mod context;
pub mod filter;
pub mod model;
pub mod notify;
pub mod permission;
pub mod requests;
pub mod screen;
pub mod screens;
pub mod validate;
pub mod workflow;

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use schoolerp_client::ConfigError;
use schoolerp_flux::{Flux, StateStore, StateValue};
use tracing::{info, warn};

pub use context::SchoolContext;
pub use filter::StudentFilter;
pub use notify::{Level, Notification};
pub use permission::{Action, Capabilities, PermissionSet};
pub use requests::{DeleteReq, DismissNotificationReq, EditReq, PageReq, RemoveRowReq, SelectFileReq, UpdateFieldReq};
pub use screen::{CrudScreen, FormState, ListInfo, Screen};
pub use screens::Screens;
pub use validate::ValidationError;
pub use workflow::{ConfirmState, FlowError, Outcome, Phase};

/// The admin application: one flux instance with every screen wired in.
pub struct SchoolAdmin {
    flux: Flux,
    ctx: Arc<SchoolContext>,
    screens: Screens,
}

impl SchoolAdmin {
    pub fn new(ctx: SchoolContext) -> Self {
        let ctx = Arc::new(ctx);
        let flux = Flux::new();
        register_app_handlers(&flux, ctx.clone());
        let screens = screens::register_all(&flux, ctx.clone());
        info!(server = ctx.api.base_url(), "school admin ready");
        Self { flux, ctx, screens }
    }

    pub fn from_config(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::new(SchoolContext::from_config(path)?))
    }

    pub fn flux(&self) -> &Flux {
        &self.flux
    }

    pub fn store(&self) -> &Arc<StateStore> {
        self.flux.store()
    }

    pub fn ctx(&self) -> &Arc<SchoolContext> {
        &self.ctx
    }

    pub fn screens(&self) -> &Screens {
        &self.screens
    }

    pub async fn emit<T: Any + Send + Sync>(&self, path: &str, payload: T) {
        self.flux.emit(path, payload).await;
    }

    pub fn get(&self, path: &str) -> Option<StateValue> {
        self.flux.get(path)
    }

    pub fn get_as<T: Any + Clone>(&self, path: &str) -> Option<T> {
        self.flux.get_as(path)
    }

    pub fn permissions(&self) -> PermissionSet {
        PermissionSet::current(self.flux.store())
    }

    pub fn notifications(&self) -> Vec<Notification> {
        notify::all(self.flux.store())
    }
}

fn register_app_handlers(flux: &Flux, ctx: Arc<SchoolContext>) {
    flux.store().set(PermissionSet::PATH, PermissionSet::default());
    flux.store().set(Notification::PATH, Vec::<Notification>::new());

    // app/initialize
    {
        let ctx = ctx.clone();
        flux.on(requests::INITIALIZE, move |_, _, store: Arc<StateStore>| {
            let ctx = ctx.clone();
            async move {
                permission::handle_load_permissions(&ctx, &store).await;
            }
        });
    }

    // auth/load-permissions
    flux.on(requests::LOAD_PERMISSIONS, move |_, _, store: Arc<StateStore>| {
        let ctx = ctx.clone();
        async move {
            permission::handle_load_permissions(&ctx, &store).await;
        }
    });

    // app/dismiss-notification
    flux.on(requests::DISMISS_NOTIFICATION, |path, payload, store: Arc<StateStore>| async move {
        let Some(req) = payload.downcast_ref::<DismissNotificationReq>() else {
            warn!(%path, "unexpected payload");
            return;
        };
        notify::dismiss(&store, req.id);
    });
}
