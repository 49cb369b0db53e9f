//! Student registration, filtered listing and Excel bulk upload.

use std::sync::Arc;
use std::time::Duration;

use schoolerp_client::{FilePart, ListParams, ResourceClient};
use schoolerp_flux::{Flux, StateStore};
use tracing::{debug, error, info, warn};

use crate::context::SchoolContext;
use crate::filter::{Debouncer, StudentFilter};
use crate::model::{BulkUploadResult, Entity, Student, StudentStatus};
use crate::notify;
use crate::permission::{self, Action};
use crate::requests::{PageReq, SelectFileReq};
use crate::screen::{register_crud, CrudScreen, FormFields, Screen};
use crate::validate::{self, ValidationError};
use crate::workflow::{FlowCell, FlowError, Outcome, StagedAction};

pub const FILTER: &str = "students/filter";
pub const PAGE: &str = "students/page";
pub const CURRENT_FILTER: &str = "students/current-filter";
pub const CURRENT_PAGE: &str = "students/current-page";

pub const UPLOAD: &str = "students/upload";
pub const UPLOAD_CONFIRM: &str = "students/upload-confirm";
pub const UPLOAD_SELECT: &str = "students/upload/select";
pub const UPLOAD_SUBMIT: &str = "students/upload/submit";
pub const UPLOAD_CONFIRM_REQ: &str = "students/upload/confirm";
pub const UPLOAD_CANCEL: &str = "students/upload/cancel";

/// Server action that imports a spreadsheet.
const BULK_UPLOAD_ACTION: &str = "bulk-upload";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentForm {
    pub first_name: String,
    pub last_name: String,
    pub student_class: String,
    pub section: String,
    pub roll_no: String,
    pub status: String,
    pub date_of_birth: String,
    pub guardian_name: String,
    pub guardian_phone: String,
}

impl FormFields for StudentForm {
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        let slot = match field {
            "first_name" => &mut self.first_name,
            "last_name" => &mut self.last_name,
            "student_class" => &mut self.student_class,
            "section" => &mut self.section,
            "roll_no" => &mut self.roll_no,
            "status" => &mut self.status,
            "date_of_birth" => &mut self.date_of_birth,
            "guardian_name" => &mut self.guardian_name,
            "guardian_phone" => &mut self.guardian_phone,
            other => return Err(ValidationError::UnknownField(other.to_string())),
        };
        *slot = value.to_string();
        Ok(())
    }
}

pub struct Students;

impl Screen for Students {
    type Entity = Student;
    type Form = StudentForm;

    fn name(&self) -> &'static str {
        "students"
    }

    fn validate(&self, form: &StudentForm, existing: &[Student], editing: Option<i64>) -> Result<Student, ValidationError> {
        let status = match form.status.trim() {
            "" => StudentStatus::default(),
            raw => StudentStatus::parse(raw).ok_or_else(|| ValidationError::InvalidChoice {
                field: "status",
                value: raw.to_string(),
            })?,
        };
        let student = Student {
            id: editing,
            first_name: validate::required("first_name", &form.first_name)?.to_string(),
            last_name: validate::required("last_name", &form.last_name)?.to_string(),
            student_class: validate::number("student_class", &form.student_class)?,
            section: validate::number("section", &form.section)?,
            roll_no: validate::optional_number("roll_no", &form.roll_no)?,
            status,
            date_of_birth: validate::optional_date("date_of_birth", &form.date_of_birth)?,
            guardian_name: validate::optional(&form.guardian_name),
            guardian_phone: validate::optional(&form.guardian_phone),
        };

        if let Some(roll) = student.roll_no {
            let taken = existing.iter().any(|s| {
                s.id != editing
                    && s.roll_no == Some(roll)
                    && s.student_class == student.student_class
                    && s.section == student.section
            });
            if taken {
                return Err(ValidationError::Duplicate {
                    field: "roll_no",
                    value: roll.to_string(),
                });
            }
        }
        Ok(student)
    }

    fn to_form(&self, s: &Student) -> StudentForm {
        StudentForm {
            first_name: s.first_name.clone(),
            last_name: s.last_name.clone(),
            student_class: s.student_class.to_string(),
            section: s.section.to_string(),
            roll_no: s.roll_no.map(|r| r.to_string()).unwrap_or_default(),
            status: s.status.as_str().to_string(),
            date_of_birth: s.date_of_birth.map(|d| d.to_string()).unwrap_or_default(),
            guardian_name: s.guardian_name.clone().unwrap_or_default(),
            guardian_phone: s.guardian_phone.clone().unwrap_or_default(),
        }
    }

    /// Keep class and section for registering several students in a row.
    fn reset(&self, form: &StudentForm) -> StudentForm {
        StudentForm {
            student_class: form.student_class.clone(),
            section: form.section.clone(),
            ..Default::default()
        }
    }

    fn list_params(&self, ctx: &SchoolContext, store: &StateStore) -> ListParams {
        let filter: StudentFilter = store.get_as(CURRENT_FILTER).unwrap_or_default();
        let page: u32 = store.get_as(CURRENT_PAGE).unwrap_or(1);
        filter.to_params(page, ctx.ui.page_size)
    }
}

// ── bulk upload ──

/// Spreadsheet picked for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadState {
    pub file: Option<FilePart>,
    pub error: Option<String>,
    pub last_result: Option<BulkUploadResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkUpload(pub FilePart);

impl StagedAction for BulkUpload {
    fn summary(&self) -> String {
        format!("Upload students from {} ({} bytes)", self.0.file_name, self.0.bytes.len())
    }
}

pub struct StudentsRuntime {
    pub crud: Arc<CrudScreen<Students>>,
    debounce: Debouncer,
    students: ResourceClient<Student>,
    upload: FlowCell<BulkUpload>,
}

impl StudentsRuntime {
    /// Handle `students/filter`: store the filter, go back to page one and
    /// fetch once the user stops typing.
    pub async fn filter(&self, store: &StateStore, filter: StudentFilter) {
        store.set(CURRENT_FILTER, filter);
        store.set(CURRENT_PAGE, 1u32);
        if self.debounce.settle().await {
            self.crud.load(store).await;
        } else {
            debug!("filter superseded by a newer one");
        }
    }

    /// Handle `students/page`.
    pub async fn page(&self, store: &StateStore, page: u32) {
        store.set(CURRENT_PAGE, page.max(1));
        self.crud.load(store).await;
    }

    /// Rows of the cached page that pass the current filter.
    pub fn visible(&self, store: &StateStore) -> Vec<Student> {
        let filter: StudentFilter = store.get_as(CURRENT_FILTER).unwrap_or_default();
        self.crud
            .list(store)
            .into_iter()
            .filter(|s| filter.matches(s))
            .collect()
    }

    /// Handle `students/upload/select`. A new selection replaces the file
    /// behind any staged upload, so that stage is dropped.
    pub fn select_file(&self, store: &StateStore, req: &SelectFileReq) -> Result<(), FlowError> {
        self.drop_stale(store);
        let checked = validate::spreadsheet(&req.file_name, req.bytes.len());
        store.update::<UploadState, _>(UPLOAD, |s| match &checked {
            Ok(()) => {
                s.file = Some(FilePart::new("file", req.file_name.clone(), req.mime.clone(), req.bytes.clone()));
                s.error = None;
            }
            Err(e) => {
                s.file = None;
                s.error = Some(e.to_string());
            }
        });
        checked.map_err(FlowError::Invalid)
    }

    /// Handle `students/upload/submit`.
    pub fn submit_upload(&self, store: &StateStore) -> Result<(), FlowError> {
        self.prepare_upload(store)
            .and_then(|upload| self.upload.stage(store, upload))
            .inspect_err(|_| self.drop_stale(store))
    }

    fn prepare_upload(&self, store: &StateStore) -> Result<BulkUpload, FlowError> {
        permission::require(store, Action::Add, Student::KIND).map_err(FlowError::PermissionDenied)?;
        let state: UploadState = store.get_as(UPLOAD).unwrap_or_default();
        let file = state.file.ok_or(ValidationError::Required("file"))?;
        validate::spreadsheet(&file.file_name, file.bytes.len())?;
        Ok(BulkUpload(file))
    }

    fn drop_stale(&self, store: &StateStore) {
        if let Some(dropped) = self.upload.discard(store) {
            debug!(action = %dropped.summary(), "stale upload dropped");
        }
    }

    /// Handle `students/upload/confirm`.
    pub async fn confirm_upload(&self, store: &StateStore) -> Result<Outcome, FlowError> {
        let BulkUpload(file) = self.upload.start(store)?;
        let file_name = file.file_name.clone();
        let result = self
            .students
            .upload::<BulkUploadResult>(BULK_UPLOAD_ACTION, vec![file])
            .await;
        match result {
            Ok(res) => {
                info!(file = %file_name, created = res.created, rejected = res.errors.len(), "bulk upload finished");
                self.upload.settle(store, Outcome::Success);
                let message = match res.errors.len() {
                    0 => format!("{} students uploaded", res.created),
                    n => format!("{} students uploaded, {} rows rejected", res.created, n),
                };
                notify::success(store, message);
                store.set(
                    UPLOAD,
                    UploadState {
                        file: None,
                        error: None,
                        last_result: Some(res),
                    },
                );
                store.invalidate(self.crud.list_path());
                Ok(Outcome::Success)
            }
            Err(e) => {
                error!(file = %file_name, error = %e, "bulk upload failed");
                self.upload.settle(store, Outcome::Error);
                notify::api_error(store, "Student upload", &e);
                Ok(Outcome::Error)
            }
        }
    }

    /// Handle `students/upload/cancel`.
    pub fn cancel_upload(&self, store: &StateStore) -> Result<(), FlowError> {
        self.upload.cancel(store).map(|_| ())
    }

    fn report(&self, store: &StateStore, err: &FlowError) {
        warn!(error = %err, "student upload request rejected");
        match err {
            FlowError::PermissionDenied(_) | FlowError::Busy => {
                notify::warning(store, err.to_string());
            }
            _ => {
                store.update::<UploadState, _>(UPLOAD, |s| s.error = Some(err.to_string()));
            }
        }
    }
}

pub fn register(flux: &Flux, ctx: Arc<SchoolContext>) -> Arc<StudentsRuntime> {
    let delay = Duration::from_millis(ctx.ui.filter_debounce_ms);
    let rt = Arc::new(StudentsRuntime {
        crud: register_crud(flux, ctx.clone(), Students),
        debounce: Debouncer::new(delay),
        students: ctx.client(),
        upload: FlowCell::new(UPLOAD_CONFIRM),
    });
    let store = flux.store();
    store.set(CURRENT_FILTER, StudentFilter::default());
    store.set(CURRENT_PAGE, 1u32);
    store.set(UPLOAD, UploadState::default());
    rt.upload.publish(store);

    {
        let rt = rt.clone();
        flux.on(FILTER, move |path, payload, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                let Some(filter) = payload.downcast_ref::<StudentFilter>() else {
                    warn!(%path, "unexpected payload");
                    return;
                };
                rt.filter(&store, filter.clone()).await;
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(PAGE, move |path, payload, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                let Some(req) = payload.downcast_ref::<PageReq>() else {
                    warn!(%path, "unexpected payload");
                    return;
                };
                rt.page(&store, req.page).await;
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(UPLOAD_SELECT, move |path, payload, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                let Some(req) = payload.downcast_ref::<SelectFileReq>() else {
                    warn!(%path, "unexpected payload");
                    return;
                };
                if let Err(e) = rt.select_file(&store, req) {
                    debug!(error = %e, "file rejected");
                }
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(UPLOAD_SUBMIT, move |_, _, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                if let Err(e) = rt.submit_upload(&store) {
                    rt.report(&store, &e);
                }
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(UPLOAD_CONFIRM_REQ, move |_, _, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                if let Err(e) = rt.confirm_upload(&store).await {
                    rt.report(&store, &e);
                }
            }
        });
    }

    {
        let rt = rt.clone();
        flux.on(UPLOAD_CANCEL, move |_, _, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                if let Err(e) = rt.cancel_upload(&store) {
                    rt.report(&store, &e);
                }
            }
        });
    }

    rt
}
