//! Client-side checks run before a mutation is staged.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::model::SubMarkConfig;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} \"{value}\" already exists")]
    Duplicate { field: &'static str, value: String },

    #[error("{field} must be a number, got \"{value}\"")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} must be a date (YYYY-MM-DD), got \"{value}\"")]
    InvalidDate { field: &'static str, value: String },

    #[error("{field} has no option \"{value}\"")]
    InvalidChoice { field: &'static str, value: String },

    #[error("{from} must not be after {to}")]
    DateRange { from: &'static str, to: &'static str },

    #[error("row {row}: {reason}")]
    MarkBounds { row: usize, reason: String },

    #[error("mark type {0} is configured more than once")]
    DuplicateMarkType(i64),

    #[error("unsupported file \"{0}\": only non-empty .xlsx or .xls files are accepted")]
    UnsupportedFile(String),

    #[error("unknown field \"{0}\"")]
    UnknownField(String),
}

/// Trimmed, non-empty value.
pub fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(value)
    }
}

/// `None` for blank input, otherwise the trimmed value.
pub fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub fn number<T: FromStr>(field: &'static str, value: &str) -> Result<T, ValidationError> {
    let value = required(field, value)?;
    value.parse().map_err(|_| ValidationError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

pub fn optional_number<T: FromStr>(field: &'static str, value: &str) -> Result<Option<T>, ValidationError> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        number(field, value).map(Some)
    }
}

/// A non-negative number.
pub fn amount(field: &'static str, value: &str) -> Result<f64, ValidationError> {
    let n: f64 = number(field, value)?;
    if n.is_finite() && n >= 0.0 {
        Ok(n)
    } else {
        Err(ValidationError::InvalidNumber {
            field,
            value: value.trim().to_string(),
        })
    }
}

pub fn date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let value = required(field, value)?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

pub fn optional_date(field: &'static str, value: &str) -> Result<Option<NaiveDate>, ValidationError> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        date(field, value).map(Some)
    }
}

/// `start <= end` when both are present.
pub fn date_range(
    from: &'static str,
    start: NaiveDate,
    to: &'static str,
    end: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    match end {
        Some(end) if start > end => Err(ValidationError::DateRange { from, to }),
        _ => Ok(()),
    }
}

/// Case-insensitive, trimmed uniqueness among `existing`. The row being
/// edited is skipped.
pub fn unique_name<'a, I>(
    field: &'static str,
    name: &str,
    existing: I,
    editing: Option<i64>,
) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = (Option<i64>, &'a str)>,
{
    let wanted = name.trim().to_lowercase();
    let clash = existing
        .into_iter()
        .filter(|(id, _)| editing.is_none() || *id != editing)
        .any(|(_, other)| other.trim().to_lowercase() == wanted);
    if clash {
        Err(ValidationError::Duplicate {
            field,
            value: name.trim().to_string(),
        })
    } else {
        Ok(())
    }
}

/// Each row: both marks non-negative and `pass_mark <= max_mark`. No mark
/// type twice.
pub fn mark_bounds(rows: &[SubMarkConfig]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for (i, row) in rows.iter().enumerate() {
        let row_no = i + 1;
        if row.max_mark < 0.0 || row.pass_mark < 0.0 {
            return Err(ValidationError::MarkBounds {
                row: row_no,
                reason: "marks must not be negative".into(),
            });
        }
        if row.pass_mark > row.max_mark {
            return Err(ValidationError::MarkBounds {
                row: row_no,
                reason: format!("pass mark {} exceeds max mark {}", row.pass_mark, row.max_mark),
            });
        }
        if !seen.insert(row.mark_type) {
            return Err(ValidationError::DuplicateMarkType(row.mark_type));
        }
    }
    Ok(())
}

/// Spreadsheet uploads: `.xlsx` or `.xls`, not empty.
pub fn spreadsheet(file_name: &str, size: usize) -> Result<(), ValidationError> {
    let lower = file_name.to_ascii_lowercase();
    if size > 0 && (lower.ends_with(".xlsx") || lower.ends_with(".xls")) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedFile(file_name.to_string()))
    }
}
