//! School entities as exposed by the REST backend.
//!
//! Every entity is a [`Resource`] (collection path + integer id) and an
//! [`Entity`] (permission codename + human label).

use schoolerp_client::Resource;

/// Identifies a resource type for permission checks and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    /// Lower-case model name used in permission codes, e.g. `studentclass`.
    pub codename: &'static str,
    /// Display label, e.g. `Class`.
    pub label: &'static str,
}

pub trait Entity: Resource {
    const KIND: ResourceKind;
}

/// Entities keyed by a unique, human-entered name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Entities whose whole payload is a name.
pub trait NameOnly: Entity + Named {
    fn from_name(id: Option<i64>, name: String) -> Self;
}

macro_rules! entity {
    ($ty:ty, $path:literal, $codename:literal, $label:literal) => {
        impl schoolerp_client::Resource for $ty {
            const PATH: &'static str = $path;
            fn id(&self) -> Option<i64> {
                self.id
            }
        }

        impl $crate::model::Entity for $ty {
            const KIND: $crate::model::ResourceKind = $crate::model::ResourceKind {
                codename: $codename,
                label: $label,
            };
        }
    };
}

macro_rules! named {
    ($ty:ty) => {
        impl $crate::model::Named for $ty {
            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

macro_rules! name_only {
    ($ty:ident) => {
        $crate::model::named!($ty);

        impl $crate::model::NameOnly for $ty {
            fn from_name(id: Option<i64>, name: String) -> Self {
                $ty { id, name }
            }
        }
    };
}

pub(crate) use {entity, name_only, named};

mod academic;
mod behavior;
mod exam;
mod facility;
mod group;
mod notice;
mod student;
mod transport;

pub use academic::{ClassConfig, ClassSubject, Section, Shift, StudentClass, Subject};
pub use behavior::{BehaviorMark, PerformanceType};
pub use exam::{MarkType, StudentMark, SubMarkConfig, SubjectMarkConfig};
pub use facility::CleanReportType;
pub use group::{Group, Permission};
pub use notice::Notice;
pub use student::{BulkUploadResult, Student, StudentStatus};
pub use transport::{TransportAllocation, TransportPackage, TransportRoute};
