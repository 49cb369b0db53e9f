//! Transport packages, routes and allocations.

use crate::model::{TransportAllocation, TransportPackage, TransportRoute};
use crate::screen::{FormFields, Screen};
use crate::validate::{self, ValidationError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageForm {
    pub name: String,
    pub amount: String,
}

impl FormFields for PackageForm {
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        match field {
            "name" => self.name = value.to_string(),
            "amount" => self.amount = value.to_string(),
            other => return Err(ValidationError::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

pub struct Packages;

impl Screen for Packages {
    type Entity = TransportPackage;
    type Form = PackageForm;

    fn name(&self) -> &'static str {
        "transport-packages"
    }

    fn validate(
        &self,
        form: &PackageForm,
        existing: &[TransportPackage],
        editing: Option<i64>,
    ) -> Result<TransportPackage, ValidationError> {
        let name = validate::required("name", &form.name)?;
        validate::unique_name("name", name, existing.iter().map(|p| (p.id, p.name.as_str())), editing)?;
        Ok(TransportPackage {
            id: editing,
            name: name.to_string(),
            amount: validate::amount("amount", &form.amount)?,
        })
    }

    fn to_form(&self, p: &TransportPackage) -> PackageForm {
        PackageForm {
            name: p.name.clone(),
            amount: p.amount.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteForm {
    pub name: String,
    pub package: String,
    pub pickup_point: String,
}

impl FormFields for RouteForm {
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        let slot = match field {
            "name" => &mut self.name,
            "package" => &mut self.package,
            "pickup_point" => &mut self.pickup_point,
            other => return Err(ValidationError::UnknownField(other.to_string())),
        };
        *slot = value.to_string();
        Ok(())
    }
}

pub struct Routes;

impl Screen for Routes {
    type Entity = TransportRoute;
    type Form = RouteForm;

    fn name(&self) -> &'static str {
        "transport-routes"
    }

    fn validate(&self, form: &RouteForm, existing: &[TransportRoute], editing: Option<i64>) -> Result<TransportRoute, ValidationError> {
        let name = validate::required("name", &form.name)?;
        validate::unique_name("name", name, existing.iter().map(|r| (r.id, r.name.as_str())), editing)?;
        Ok(TransportRoute {
            id: editing,
            name: name.to_string(),
            package: validate::number("package", &form.package)?,
            pickup_point: validate::optional(&form.pickup_point),
        })
    }

    fn to_form(&self, r: &TransportRoute) -> RouteForm {
        RouteForm {
            name: r.name.clone(),
            package: r.package.to_string(),
            pickup_point: r.pickup_point.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationForm {
    pub student: String,
    pub route: String,
    pub start_date: String,
    pub end_date: String,
}

impl FormFields for AllocationForm {
    fn set_field(&mut self, field: &str, value: &str) -> Result<(), ValidationError> {
        let slot = match field {
            "student" => &mut self.student,
            "route" => &mut self.route,
            "start_date" => &mut self.start_date,
            "end_date" => &mut self.end_date,
            other => return Err(ValidationError::UnknownField(other.to_string())),
        };
        *slot = value.to_string();
        Ok(())
    }
}

pub struct Allocations;

impl Screen for Allocations {
    type Entity = TransportAllocation;
    type Form = AllocationForm;

    fn name(&self) -> &'static str {
        "transport-allocations"
    }

    fn validate(
        &self,
        form: &AllocationForm,
        _: &[TransportAllocation],
        editing: Option<i64>,
    ) -> Result<TransportAllocation, ValidationError> {
        let start_date = validate::date("start_date", &form.start_date)?;
        let end_date = validate::optional_date("end_date", &form.end_date)?;
        validate::date_range("start_date", start_date, "end_date", end_date)?;
        Ok(TransportAllocation {
            id: editing,
            student: validate::number("student", &form.student)?,
            route: validate::number("route", &form.route)?,
            start_date,
            end_date,
        })
    }

    fn to_form(&self, a: &TransportAllocation) -> AllocationForm {
        AllocationForm {
            student: a.student.to_string(),
            route: a.route.to_string(),
            start_date: a.start_date.to_string(),
            end_date: a.end_date.map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}
