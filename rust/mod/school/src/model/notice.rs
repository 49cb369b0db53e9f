use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entity;

/// A published notice. `attachment` is the server-side file URL; uploads
/// go through a multipart body instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub notice_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

entity!(Notice, "notices", "notice", "Notice");

impl crate::model::Named for Notice {
    fn name(&self) -> &str {
        &self.title
    }
}
