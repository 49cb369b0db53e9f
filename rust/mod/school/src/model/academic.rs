use serde::{Deserialize, Serialize};

use super::{entity, name_only, named};

/// A grade/standard, e.g. "Class 7".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentClass {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

entity!(StudentClass, "classes", "studentclass", "Class");
name_only!(StudentClass);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

entity!(Section, "sections", "section", "Section");
name_only!(Section);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

entity!(Shift, "shifts", "shift", "Shift");
name_only!(Shift);

/// Which sections and shifts a class runs in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub student_class: i64,
    pub section: i64,
    pub shift: i64,
}

entity!(ClassConfig, "class-configs", "classconfig", "Class configuration");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

entity!(Subject, "subjects", "subject", "Subject");
named!(Subject);

/// Membership row: `subject` is taught in `student_class`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSubject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub student_class: i64,
    pub subject: i64,
}

entity!(ClassSubject, "class-subjects", "classsubject", "Class subject");
