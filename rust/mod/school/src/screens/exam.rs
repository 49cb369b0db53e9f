//! Subject mark configurations and student marks.

use std::sync::Arc;

use schoolerp_flux::{Flux, StateStore};
use tracing::{debug, warn};

use crate::context::SchoolContext;
use crate::model::{Student, StudentMark, SubMarkConfig, SubjectMarkConfig};
use crate::requests::RemoveRowReq;
use crate::screen::{register_crud, CrudScreen, FormFields, Screen};
use crate::validate::{self, ValidationError};

pub const REMOVE_ROW: &str = "subject-mark-configs/remove-row";

/// One mark-type row of the configuration form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubMarkRow {
    pub mark_type: String,
    pub max_mark: String,
    pub pass_mark: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectMarkConfigForm {
    pub student_class: String,
    pub subject: String,
    pub rows: Vec<SubMarkRow>,
}

impl FormFields for SubjectMarkConfigForm {
    /// Row fields are addressed as `sub_configs.{index}.{column}`; writing
    /// one past the last row appends a row.
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        let unknown = || ValidationError::UnknownField(field.to_string());
        match field {
            "student_class" => self.student_class = value.to_string(),
            "subject" => self.subject = value.to_string(),
            _ => {
                let mut parts = field.splitn(3, '.');
                let (Some("sub_configs"), Some(index), Some(column)) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(unknown());
                };
                let index: usize = index.parse().map_err(|_| unknown())?;
                if index > self.rows.len() {
                    return Err(unknown());
                }
                if index == self.rows.len() {
                    self.rows.push(SubMarkRow::default());
                }
                let row = &mut self.rows[index];
                let slot = match column {
                    "mark_type" => &mut row.mark_type,
                    "max_mark" => &mut row.max_mark,
                    "pass_mark" => &mut row.pass_mark,
                    _ => return Err(unknown()),
                };
                *slot = value.to_string();
            }
        }
        Ok(())
    }
}

pub struct SubjectMarkConfigs;

impl Screen for SubjectMarkConfigs {
    type Entity = SubjectMarkConfig;
    type Form = SubjectMarkConfigForm;

    fn name(&self) -> &'static str {
        "subject-mark-configs"
    }

    fn validate(
        &self,
        form: &SubjectMarkConfigForm,
        existing: &[SubjectMarkConfig],
        editing: Option<i64>,
    ) -> Result<SubjectMarkConfig, ValidationError> {
        let student_class = validate::number("student_class", &form.student_class)?;
        let subject = validate::number("subject", &form.subject)?;
        if form.rows.is_empty() {
            return Err(ValidationError::Required("sub_configs"));
        }
        let sub_configs = form
            .rows
            .iter()
            .map(|row| {
                Ok(SubMarkConfig {
                    mark_type: validate::number("mark_type", &row.mark_type)?,
                    max_mark: validate::number("max_mark", &row.max_mark)?,
                    pass_mark: validate::number("pass_mark", &row.pass_mark)?,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;
        validate::mark_bounds(&sub_configs)?;

        let taken = existing
            .iter()
            .any(|c| c.id != editing && c.student_class == student_class && c.subject == subject);
        if taken {
            return Err(ValidationError::Duplicate {
                field: "mark configuration",
                value: format!("class {} / subject {}", student_class, subject),
            });
        }

        Ok(SubjectMarkConfig {
            id: editing,
            student_class,
            subject,
            sub_configs,
        })
    }

    fn to_form(&self, c: &SubjectMarkConfig) -> SubjectMarkConfigForm {
        SubjectMarkConfigForm {
            student_class: c.student_class.to_string(),
            subject: c.subject.to_string(),
            rows: c
                .sub_configs
                .iter()
                .map(|s| SubMarkRow {
                    mark_type: s.mark_type.to_string(),
                    max_mark: s.max_mark.to_string(),
                    pass_mark: s.pass_mark.to_string(),
                })
                .collect(),
        }
    }
}

pub fn register(flux: &Flux, ctx: Arc<SchoolContext>) -> Arc<CrudScreen<SubjectMarkConfigs>> {
    let rt = register_crud(flux, ctx, SubjectMarkConfigs);
    {
        let rt = rt.clone();
        flux.on(REMOVE_ROW, move |path, payload, store: Arc<StateStore>| {
            let rt = rt.clone();
            async move {
                let Some(req) = payload.downcast_ref::<RemoveRowReq>() else {
                    warn!(%path, "unexpected payload");
                    return;
                };
                let index = req.index;
                rt.edit_form(&store, |form| {
                    if index < form.rows.len() {
                        form.rows.remove(index);
                    }
                });
            }
        });
    }
    rt
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentMarkForm {
    pub student: String,
    pub subject: String,
    pub mark_type: String,
    pub marks: String,
    pub remarks: String,
}

impl FormFields for StudentMarkForm {
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        let slot = match field {
            "student" => &mut self.student,
            "subject" => &mut self.subject,
            "mark_type" => &mut self.mark_type,
            "marks" => &mut self.marks,
            "remarks" => &mut self.remarks,
            other => return Err(ValidationError::UnknownField(other.to_string())),
        };
        *slot = value.to_string();
        Ok(())
    }
}

pub struct Marks;

impl Screen for Marks {
    type Entity = StudentMark;
    type Form = StudentMarkForm;

    fn name(&self) -> &'static str {
        "marks"
    }

    fn validate(&self, form: &StudentMarkForm, _: &[StudentMark], editing: Option<i64>) -> Result<StudentMark, ValidationError> {
        Ok(StudentMark {
            id: editing,
            student: validate::number("student", &form.student)?,
            subject: validate::number("subject", &form.subject)?,
            mark_type: validate::number("mark_type", &form.mark_type)?,
            marks: validate::amount("marks", &form.marks)?,
            remarks: validate::optional(&form.remarks),
        })
    }

    /// Marks may not exceed the configured maximum for the student's class,
    /// subject and mark type, when that configuration is loaded.
    ///
    /// The class comes from the cached student list. Without it, the check
    /// only applies when every class configures the same maximum.
    fn cross_check(&self, mark: &StudentMark, store: &StateStore) -> Result<(), ValidationError> {
        let configs: Vec<SubjectMarkConfig> = store.get_as("subject-mark-configs/list").unwrap_or_default();
        let class = store
            .get_as::<Vec<Student>>("students/list")
            .unwrap_or_default()
            .into_iter()
            .find(|s| s.id == Some(mark.student))
            .map(|s| s.student_class);

        let mut maxima = configs
            .iter()
            .filter(|c| c.subject == mark.subject && class.map_or(true, |class| c.student_class == class))
            .flat_map(|c| c.sub_configs.iter())
            .filter(|s| s.mark_type == mark.mark_type)
            .map(|s| s.max_mark);
        let Some(max) = maxima.next() else {
            return Ok(());
        };
        if maxima.any(|other| other != max) {
            debug!(student = mark.student, subject = mark.subject, "class unknown and maxima differ, bound not checked");
            return Ok(());
        }
        if mark.marks > max {
            return Err(ValidationError::MarkBounds {
                row: 1,
                reason: format!("marks {} exceed max mark {}", mark.marks, max),
            });
        }
        Ok(())
    }

    fn to_form(&self, m: &StudentMark) -> StudentMarkForm {
        StudentMarkForm {
            student: m.student.to_string(),
            subject: m.subject.to_string(),
            mark_type: m.mark_type.to_string(),
            marks: m.marks.to_string(),
            remarks: m.remarks.clone().unwrap_or_default(),
        }
    }

    /// Keep subject and mark type for entering the next student.
    fn reset(&self, form: &StudentMarkForm) -> StudentMarkForm {
        StudentMarkForm {
            subject: form.subject.clone(),
            mark_type: form.mark_type.clone(),
            ..Default::default()
        }
    }
}
