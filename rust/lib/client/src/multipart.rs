//! `multipart/form-data` bodies for attachments and bulk uploads.

use reqwest::multipart::{Form, Part};
use serde::Serialize;

use crate::error::ApiError;

/// One file attached to a multipart request.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    fn into_part(self) -> Result<(String, Part), ApiError> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.mime)?;
        Ok((self.field, part))
    }
}

/// Flatten a serializable object into text parts.
///
/// Nulls are dropped; nested arrays/objects are sent as JSON text. Fields
/// that a file part also names are left to the file.
pub fn text_fields<T: Serialize>(item: &T, skip: &[&str]) -> Result<Vec<(String, String)>, ApiError> {
    let value = serde_json::to_value(item)
        .map_err(|e| ApiError::Decode(format!("multipart body: {}", e)))?;
    let serde_json::Value::Object(map) = value else {
        return Err(ApiError::Decode("multipart body must be an object".into()));
    };
    Ok(map
        .into_iter()
        .filter(|(k, _)| !skip.contains(&k.as_str()))
        .filter_map(|(k, v)| {
            let text = match v {
                serde_json::Value::Null => return None,
                serde_json::Value::String(s) => s,
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            Some((k, text))
        })
        .collect())
}

pub(crate) fn form_from<T: Serialize>(item: &T, files: Vec<FilePart>) -> Result<Form, ApiError> {
    let skip: Vec<String> = files.iter().map(|f| f.field.clone()).collect();
    let skip: Vec<&str> = skip.iter().map(String::as_str).collect();
    let mut form = Form::new();
    for (k, v) in text_fields(item, &skip)? {
        form = form.text(k, v);
    }
    attach(form, files)
}

pub(crate) fn files_only(files: Vec<FilePart>) -> Result<Form, ApiError> {
    attach(Form::new(), files)
}

fn attach(mut form: Form, files: Vec<FilePart>) -> Result<Form, ApiError> {
    for file in files {
        let (field, part) = file.into_part()?;
        form = form.part(field, part);
    }
    Ok(form)
}
