//! Performance types and behavior marks.

use schoolerp_flux::StateStore;

use crate::model::{BehaviorMark, PerformanceType};
use crate::screen::{FormFields, Screen};
use crate::validate::{self, ValidationError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceTypeForm {
    pub name: String,
    pub max_mark: String,
}

impl FormFields for PerformanceTypeForm {
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        match field {
            "name" => self.name = value.to_string(),
            "max_mark" => self.max_mark = value.to_string(),
            other => return Err(ValidationError::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

pub struct PerformanceTypes;

impl Screen for PerformanceTypes {
    type Entity = PerformanceType;
    type Form = PerformanceTypeForm;

    fn name(&self) -> &'static str {
        "performance-types"
    }

    fn validate(
        &self,
        form: &PerformanceTypeForm,
        existing: &[PerformanceType],
        editing: Option<i64>,
    ) -> Result<PerformanceType, ValidationError> {
        let name = validate::required("name", &form.name)?;
        validate::unique_name("name", name, existing.iter().map(|p| (p.id, p.name.as_str())), editing)?;
        Ok(PerformanceType {
            id: editing,
            name: name.to_string(),
            max_mark: validate::amount("max_mark", &form.max_mark)?,
        })
    }

    fn to_form(&self, p: &PerformanceType) -> PerformanceTypeForm {
        PerformanceTypeForm {
            name: p.name.clone(),
            max_mark: p.max_mark.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BehaviorMarkForm {
    pub student: String,
    pub performance_type: String,
    pub mark: String,
    pub date: String,
    pub remarks: String,
}

impl FormFields for BehaviorMarkForm {
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        let slot = match field {
            "student" => &mut self.student,
            "performance_type" => &mut self.performance_type,
            "mark" => &mut self.mark,
            "date" => &mut self.date,
            "remarks" => &mut self.remarks,
            other => return Err(ValidationError::UnknownField(other.to_string())),
        };
        *slot = value.to_string();
        Ok(())
    }
}

pub struct BehaviorMarks;

impl Screen for BehaviorMarks {
    type Entity = BehaviorMark;
    type Form = BehaviorMarkForm;

    fn name(&self) -> &'static str {
        "behavior-marks"
    }

    fn validate(&self, form: &BehaviorMarkForm, _: &[BehaviorMark], editing: Option<i64>) -> Result<BehaviorMark, ValidationError> {
        Ok(BehaviorMark {
            id: editing,
            student: validate::number("student", &form.student)?,
            performance_type: validate::number("performance_type", &form.performance_type)?,
            mark: validate::amount("mark", &form.mark)?,
            date: validate::date("date", &form.date)?,
            remarks: validate::optional(&form.remarks),
        })
    }

    fn cross_check(&self, mark: &BehaviorMark, store: &StateStore) -> Result<(), ValidationError> {
        let types: Vec<PerformanceType> = store.get_as("performance-types/list").unwrap_or_default();
        match types.iter().find(|t| t.id == Some(mark.performance_type)) {
            Some(t) if mark.mark > t.max_mark => Err(ValidationError::MarkBounds {
                row: 1,
                reason: format!("mark {} exceeds {} maximum of {}", mark.mark, t.name, t.max_mark),
            }),
            _ => Ok(()),
        }
    }

    fn to_form(&self, m: &BehaviorMark) -> BehaviorMarkForm {
        BehaviorMarkForm {
            student: m.student.to_string(),
            performance_type: m.performance_type.to_string(),
            mark: m.mark.to_string(),
            date: m.date.to_string(),
            remarks: m.remarks.clone().unwrap_or_default(),
        }
    }

    /// Keep type and date for recording the next student.
    fn reset(&self, form: &BehaviorMarkForm) -> BehaviorMarkForm {
        BehaviorMarkForm {
            performance_type: form.performance_type.clone(),
            date: form.date.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_cannot_exceed_type_maximum() {
        let store = StateStore::new();
        store.set(
            "performance-types/list",
            vec![PerformanceType {
                id: Some(3),
                name: "Discipline".into(),
                max_mark: 10.0,
            }],
        );
        let form = BehaviorMarkForm {
            student: "1".into(),
            performance_type: "3".into(),
            mark: "11".into(),
            date: "2026-10-18".into(),
            remarks: " ".into(),
        };
        let mark = BehaviorMarks.validate(&form, &[], None).unwrap();
        assert_eq!(mark.remarks, None);
        assert!(matches!(
            BehaviorMarks.cross_check(&mark, &store),
            Err(ValidationError::MarkBounds { .. })
        ));
    }

    #[test]
    fn performance_type_needs_numeric_max() {
        let form = PerformanceTypeForm {
            name: "Punctuality".into(),
            max_mark: "ten".into(),
        };
        assert!(matches!(
            PerformanceTypes.validate(&form, &[], None),
            Err(ValidationError::InvalidNumber { field: "max_mark", .. })
        ));
    }
}
