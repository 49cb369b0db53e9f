//! Request payloads and paths the shell emits.
//!
//! Per-screen requests live under the screen name, e.g. `sections/submit`;
//! see [`screen_path`].

pub const INITIALIZE: &str = "app/initialize";
pub const DISMISS_NOTIFICATION: &str = "app/dismiss-notification";
pub const LOAD_PERMISSIONS: &str = "auth/load-permissions";

/// Operations every CRUD screen answers to.
pub mod op {
    pub const LOAD: &str = "load";
    pub const UPDATE_FIELD: &str = "update-field";
    pub const EDIT: &str = "edit";
    pub const RESET: &str = "reset";
    pub const SUBMIT: &str = "submit";
    pub const DELETE: &str = "delete";
    pub const CONFIRM: &str = "confirm";
    pub const CANCEL: &str = "cancel";
}

/// State paths every CRUD screen publishes.
pub mod state {
    pub const LIST: &str = "list";
    pub const FORM: &str = "form";
    pub const CONFIRM: &str = "confirm";
}

pub fn screen_path(screen: &str, leaf: &str) -> String {
    format!("{}/{}", screen, leaf)
}

/// Set one form field from raw input.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFieldReq {
    pub field: String,
    pub value: String,
}

impl UpdateFieldReq {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Load an existing row into the form for editing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditReq {
    pub id: i64,
}

/// Stage deletion of a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeleteReq {
    pub id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DismissNotificationReq {
    pub id: u64,
}

/// A file picked by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectFileReq {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Drop one row of a repeated form section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoveRowReq {
    pub index: usize,
}

/// Switch to another page of a paginated list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageReq {
    pub page: u32,
}
