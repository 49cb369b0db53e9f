use serde::{Deserialize, Serialize};

use super::{entity, name_only};

/// Exam component, e.g. "Written" or "Practical".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

entity!(MarkType, "mark-types", "marktype", "Mark type");
name_only!(MarkType);

/// Per-component bounds inside a [`SubjectMarkConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubMarkConfig {
    pub mark_type: i64,
    pub max_mark: f64,
    pub pass_mark: f64,
}

/// How a subject is marked in a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMarkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub student_class: i64,
    pub subject: i64,
    #[serde(default)]
    pub sub_configs: Vec<SubMarkConfig>,
}

entity!(SubjectMarkConfig, "subject-mark-configs", "subjectmarkconfig", "Subject mark configuration");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentMark {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub student: i64,
    pub subject: i64,
    pub mark_type: i64,
    pub marks: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

entity!(StudentMark, "marks", "studentmark", "Mark");
