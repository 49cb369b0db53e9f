use serde::{Deserialize, Serialize};

use super::entity;

/// One grantable permission, e.g. `{ codename: "add_section" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub codename: String,
}

/// A user group and the permissions granted to its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

entity!(Group, "groups", "group", "Group");

impl Group {
    pub fn codenames(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(|p| p.codename.as_str())
    }
}
