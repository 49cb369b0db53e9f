use serde::{Deserialize, Serialize};

use super::{entity, name_only};

/// Category of a cleanliness report, e.g. "Classroom" or "Washroom".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanReportType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

entity!(CleanReportType, "clean-report-types", "cleanreporttype", "Clean report type");
name_only!(CleanReportType);
