//! Notices, optionally with a file attachment.

use std::sync::Arc;

use schoolerp_client::FilePart;
use schoolerp_flux::{Flux, StateStore};
use tracing::warn;

use crate::context::SchoolContext;
use crate::model::Notice;
use crate::requests::SelectFileReq;
use crate::screen::{register_crud, CrudScreen, FormFields, Screen};
use crate::validate::{self, ValidationError};

pub const ATTACH: &str = "notices/attach";
pub const DETACH: &str = "notices/detach";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoticeForm {
    pub title: String,
    pub description: String,
    pub notice_date: String,
    pub expiry_date: String,
    /// New file to upload with the notice.
    pub attachment: Option<FilePart>,
    /// Name of the file already stored on the server, when editing.
    pub current_attachment: Option<String>,
}

impl FormFields for NoticeForm {
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        let slot = match field {
            "title" => &mut self.title,
            "description" => &mut self.description,
            "notice_date" => &mut self.notice_date,
            "expiry_date" => &mut self.expiry_date,
            other => return Err(ValidationError::UnknownField(other.to_string())),
        };
        *slot = value.to_string();
        Ok(())
    }
}

pub struct Notices;

impl Screen for Notices {
    type Entity = Notice;
    type Form = NoticeForm;

    fn name(&self) -> &'static str {
        "notices"
    }

    fn validate(&self, form: &NoticeForm, _: &[Notice], editing: Option<i64>) -> Result<Notice, ValidationError> {
        let title = validate::required("title", &form.title)?;
        let notice_date = validate::date("notice_date", &form.notice_date)?;
        let expiry_date = validate::optional_date("expiry_date", &form.expiry_date)?;
        validate::date_range("notice_date", notice_date, "expiry_date", expiry_date)?;
        Ok(Notice {
            id: editing,
            title: title.to_string(),
            description: form.description.trim().to_string(),
            notice_date,
            expiry_date,
            // The stored file URL is never echoed back.
            attachment: None,
        })
    }

    fn to_form(&self, n: &Notice) -> NoticeForm {
        NoticeForm {
            title: n.title.clone(),
            description: n.description.clone(),
            notice_date: n.notice_date.to_string(),
            expiry_date: n.expiry_date.map(|d| d.to_string()).unwrap_or_default(),
            attachment: None,
            current_attachment: n.attachment.clone(),
        }
    }

    fn files(&self, form: &NoticeForm) -> Vec<FilePart> {
        form.attachment.iter().cloned().collect()
    }
}

pub fn register(flux: &Flux, ctx: Arc<SchoolContext>) -> Arc<CrudScreen<Notices>> {
    let rt = register_crud(flux, ctx, Notices);

    {
        let rt = rt.clone();
        flux.on(ATTACH, move |path, payload, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                let Some(req) = payload.downcast_ref::<SelectFileReq>() else {
                    warn!(%path, "unexpected payload");
                    return;
                };
                let file = FilePart::new("attachment", req.file_name.clone(), req.mime.clone(), req.bytes.clone());
                rt.edit_form(&store, |form| form.attachment = Some(file));
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(DETACH, move |_, _, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                rt.edit_form(&store, |form| form.attachment = None);
            }
        });
    }

    rt
}
