//! The admin screens.

pub mod academic;
pub mod behavior;
pub mod classes;
pub mod exam;
pub mod notices;
pub mod students;
pub mod transport;

use std::marker::PhantomData;
use std::sync::Arc;

use schoolerp_flux::Flux;

use crate::context::SchoolContext;
use crate::model::{CleanReportType, MarkType, NameOnly, Section, Shift, StudentClass};
use crate::screen::{register_crud, FormFields, Screen};
use crate::validate::{self, ValidationError};

/// Handles returned by [`register_all`] for screens with extra state.
pub struct Screens {
    pub classes: Arc<classes::ClassesRuntime>,
    pub students: Arc<students::StudentsRuntime>,
}

pub fn register_all(flux: &Flux, ctx: Arc<SchoolContext>) -> Screens {
    let classes = classes::register(flux, ctx.clone());
    register_crud(flux, ctx.clone(), NameScreen::<Section>::new("sections"));
    register_crud(flux, ctx.clone(), NameScreen::<Shift>::new("shifts"));
    register_crud(flux, ctx.clone(), academic::ClassConfigs);
    register_crud(flux, ctx.clone(), academic::Subjects);
    register_crud(flux, ctx.clone(), NameScreen::<MarkType>::new("mark-types"));
    exam::register(flux, ctx.clone());
    register_crud(flux, ctx.clone(), exam::Marks);
    notices::register(flux, ctx.clone());
    register_crud(flux, ctx.clone(), behavior::PerformanceTypes);
    register_crud(flux, ctx.clone(), behavior::BehaviorMarks);
    register_crud(flux, ctx.clone(), transport::Packages);
    register_crud(flux, ctx.clone(), transport::Routes);
    register_crud(flux, ctx.clone(), transport::Allocations);
    register_crud(flux, ctx.clone(), NameScreen::<CleanReportType>::new("clean-report-types"));
    let students = students::register(flux, ctx);
    Screens { classes, students }
}

/// Form of a name-only entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameForm {
    pub name: String,
}

impl FormFields for NameForm {
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        match field {
            "name" => self.name = value.to_string(),
            other => return Err(ValidationError::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

/// Screen for entities that are just a unique name.
pub struct NameScreen<E> {
    name: &'static str,
    _entity: PhantomData<fn() -> E>,
}

impl<E> NameScreen<E> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            _entity: PhantomData,
        }
    }
}

impl<E: NameOnly> Screen for NameScreen<E> {
    type Entity = E;
    type Form = NameForm;

    fn name(&self) -> &'static str {
        self.name
    }

    fn validate(&self, form: &NameForm, existing: &[E], editing: Option<i64>) -> Result<E, ValidationError> {
        let name = validate::required("name", &form.name)?;
        validate::unique_name("name", name, existing.iter().map(|e| (e.id(), e.name())), editing)?;
        Ok(E::from_name(editing, name.to_string()))
    }

    fn to_form(&self, entity: &E) -> NameForm {
        NameForm {
            name: entity.name().to_string(),
        }
    }
}

/// Name screen for classes; the class-subject handlers hang off it.
pub type ClassScreen = NameScreen<StudentClass>;
