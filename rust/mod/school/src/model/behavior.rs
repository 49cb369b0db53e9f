use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{entity, named};

/// A graded behavior dimension (discipline, punctuality, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub max_mark: f64,
}

entity!(PerformanceType, "performance-types", "performancetype", "Performance type");
named!(PerformanceType);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorMark {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub student: i64,
    pub performance_type: i64,
    pub mark: f64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

entity!(BehaviorMark, "behavior-marks", "behaviormark", "Behavior mark");
