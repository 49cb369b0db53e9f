//! Permission gate.
//!
//! A group's permission list is fetched once and cached at
//! [`PermissionSet::PATH`]. Screens ask it for the [`Capabilities`] of one
//! resource kind. Until the list has loaded every capability is `false`.

use std::collections::BTreeSet;
use std::fmt;

use schoolerp_client::ResourceClient;
use schoolerp_flux::StateStore;
use tracing::{debug, error, warn};

use crate::context::SchoolContext;
use crate::model::{Group, ResourceKind};

/// The four model-level actions the backend grants per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Add,
    Change,
    Delete,
    View,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Change => "change",
            Action::Delete => "delete",
            Action::View => "view",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{action}_{codename}`, e.g. `add_studentclass`.
pub fn permission_code(action: Action, kind: ResourceKind) -> String {
    format!("{}_{}", action, kind.codename)
}

/// The granted permission codes of the signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    codes: BTreeSet<String>,
    superuser: bool,
}

impl PermissionSet {
    pub const PATH: &'static str = "auth/permissions";

    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
            superuser: false,
        }
    }

    /// Grants everything.
    pub fn superuser() -> Self {
        Self {
            codes: BTreeSet::new(),
            superuser: true,
        }
    }

    pub fn is_superuser(&self) -> bool {
        self.superuser
    }

    pub fn has(&self, code: &str) -> bool {
        self.superuser || self.codes.contains(code)
    }

    pub fn capabilities(&self, kind: ResourceKind) -> Capabilities {
        Capabilities {
            add: self.has(&permission_code(Action::Add, kind)),
            change: self.has(&permission_code(Action::Change, kind)),
            delete: self.has(&permission_code(Action::Delete, kind)),
            view: self.has(&permission_code(Action::View, kind)),
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty() && !self.superuser
    }

    /// Current set from the store; empty (deny-all) when not loaded.
    pub fn current(store: &StateStore) -> Self {
        store.get_as::<PermissionSet>(Self::PATH).unwrap_or_default()
    }
}

/// Resolved flags for one resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub add: bool,
    pub change: bool,
    pub delete: bool,
    pub view: bool,
}

impl Capabilities {
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Add => self.add,
            Action::Change => self.change,
            Action::Delete => self.delete,
            Action::View => self.view,
        }
    }
}

/// Handle `auth/load-permissions`.
///
/// Superuser contexts skip the fetch. Without a group the fetch is skipped
/// and the gate stays closed. A failed fetch also leaves the gate closed.
pub async fn handle_load_permissions(ctx: &SchoolContext, store: &StateStore) {
    store.register_query(PermissionSet::PATH, crate::requests::LOAD_PERMISSIONS);

    if ctx.superuser {
        debug!("superuser context, permission fetch skipped");
        store.finish_fetch(PermissionSet::PATH, PermissionSet::superuser());
        return;
    }

    let Some(group_id) = ctx.group else {
        debug!("no group configured, permission fetch skipped");
        store.finish_fetch(PermissionSet::PATH, PermissionSet::default());
        return;
    };

    store.begin_fetch(PermissionSet::PATH);
    let groups: ResourceClient<Group> = ctx.client();
    match groups.get(group_id).await {
        Ok(group) => {
            let set = PermissionSet::from_codes(group.codenames());
            debug!(group = group_id, codes = set.len(), "permissions loaded");
            store.finish_fetch(PermissionSet::PATH, set);
        }
        Err(e) => {
            error!(group = group_id, error = %e, "failed to load permissions");
            store.set(PermissionSet::PATH, PermissionSet::default());
            store.fail_fetch(PermissionSet::PATH, e.detail());
        }
    }
}

/// Check `action` on `kind`, logging a rejection.
pub fn require(store: &StateStore, action: Action, kind: ResourceKind) -> Result<(), String> {
    let code = permission_code(action, kind);
    if PermissionSet::current(store).has(&code) {
        Ok(())
    } else {
        warn!(permission = %code, "permission denied");
        Err(code)
    }
}
