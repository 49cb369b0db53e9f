use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{entity, named};

/// Fare plan a route is billed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportPackage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub amount: f64,
}

entity!(TransportPackage, "transport-packages", "transportpackage", "Transport package");
named!(TransportPackage);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportRoute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub package: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_point: Option<String>,
}

entity!(TransportRoute, "transport-routes", "transportroute", "Transport route");
named!(TransportRoute);

/// A student assigned to a route for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportAllocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub student: i64,
    pub route: i64,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

entity!(TransportAllocation, "transport-allocations", "transportallocation", "Transport allocation");
