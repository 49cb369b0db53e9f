//! Class configurations and subjects.

use crate::model::{ClassConfig, Subject};
use crate::screen::{FormFields, Screen};
use crate::validate::{self, ValidationError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassConfigForm {
    pub student_class: String,
    pub section: String,
    pub shift: String,
}

impl FormFields for ClassConfigForm {
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        let slot = match field {
            "student_class" => &mut self.student_class,
            "section" => &mut self.section,
            "shift" => &mut self.shift,
            other => return Err(ValidationError::UnknownField(other.to_string())),
        };
        *slot = value.to_string();
        Ok(())
    }
}

pub struct ClassConfigs;

impl Screen for ClassConfigs {
    type Entity = ClassConfig;
    type Form = ClassConfigForm;

    fn name(&self) -> &'static str {
        "class-configs"
    }

    fn validate(
        &self,
        form: &ClassConfigForm,
        existing: &[ClassConfig],
        editing: Option<i64>,
    ) -> Result<ClassConfig, ValidationError> {
        let config = ClassConfig {
            id: editing,
            student_class: validate::number("student_class", &form.student_class)?,
            section: validate::number("section", &form.section)?,
            shift: validate::number("shift", &form.shift)?,
        };
        let taken = existing.iter().any(|c| {
            c.id != editing
                && c.student_class == config.student_class
                && c.section == config.section
                && c.shift == config.shift
        });
        if taken {
            return Err(ValidationError::Duplicate {
                field: "class configuration",
                value: format!(
                    "class {} / section {} / shift {}",
                    config.student_class, config.section, config.shift
                ),
            });
        }
        Ok(config)
    }

    fn to_form(&self, c: &ClassConfig) -> ClassConfigForm {
        ClassConfigForm {
            student_class: c.student_class.to_string(),
            section: c.section.to_string(),
            shift: c.shift.to_string(),
        }
    }

    /// Keep the class selected so several sections can be added in a row.
    fn reset(&self, form: &ClassConfigForm) -> ClassConfigForm {
        ClassConfigForm {
            student_class: form.student_class.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectForm {
    pub name: String,
    pub code: String,
}

impl FormFields for SubjectForm {
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        match field {
            "name" => self.name = value.to_string(),
            "code" => self.code = value.to_string(),
            other => return Err(ValidationError::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

pub struct Subjects;

impl Screen for Subjects {
    type Entity = Subject;
    type Form = SubjectForm;

    fn name(&self) -> &'static str {
        "subjects"
    }

    fn validate(&self, form: &SubjectForm, existing: &[Subject], editing: Option<i64>) -> Result<Subject, ValidationError> {
        let name = validate::required("name", &form.name)?;
        validate::unique_name("name", name, existing.iter().map(|s| (s.id, s.name.as_str())), editing)?;
        let code = validate::optional(&form.code);
        if let Some(code) = &code {
            let codes = existing
                .iter()
                .filter_map(|s| s.code.as_deref().map(|c| (s.id, c)));
            validate::unique_name("code", code, codes, editing)?;
        }
        Ok(Subject {
            id: editing,
            name: name.to_string(),
            code,
        })
    }

    fn to_form(&self, s: &Subject) -> SubjectForm {
        SubjectForm {
            name: s.name.clone(),
            code: s.code.clone().unwrap_or_default(),
        }
    }
}
