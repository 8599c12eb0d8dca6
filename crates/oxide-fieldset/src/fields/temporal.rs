//! Date and date-time field types.

use std::any::Any;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use crate::error::Invalid;
use crate::field::{BoundField, FieldType};
use crate::value::Value;

const ERROR_INVALID_DATE: &str = "Invalid date";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses the `year-month-day` fallback form, e.g. `2024-1-5`.
fn parse_ymd(text: &str) -> Option<NaiveDate> {
    let mut parts = text.splitn(3, '-').map(|p| p.trim().parse::<i32>().ok());
    let year = parts.next()??;
    let month = u32::try_from(parts.next()??).ok()?;
    let day = u32::try_from(parts.next()??).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_naive_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Date input accepting ISO 8601. Values are [`Value::Date`].
#[derive(Debug, Clone, Default)]
pub struct DateField;

impl DateField {
    /// Creates a date field kind.
    pub fn new() -> Self {
        Self
    }
}

impl FieldType for DateField {
    fn type_name(&self) -> &str {
        "date"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn css_class(&self) -> Option<&str> {
        Some("date-widget")
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Date(_))
    }

    fn to_form(&self, field: &BoundField, value: &Value) -> Result<Value, Invalid> {
        match value {
            Value::Date(date) => Ok(Value::Text(date.format("%Y-%m-%d").to_string())),
            Value::DateTime(dt) => Ok(Value::Text(dt.date_naive().format("%Y-%m-%d").to_string())),
            _ => Err(field
                .invalid("\"${val}\" is not a date object")
                .with_mapping("val", value)),
        }
    }

    fn to_field(&self, field: &BoundField, value: &Value) -> Result<Value, Invalid> {
        if value.is_blank() {
            return Ok(Value::Null);
        }
        let text = match value {
            Value::Date(_) => return Ok(value.clone()),
            Value::DateTime(dt) => return Ok(Value::Date(dt.date_naive())),
            Value::Text(text) => text.trim(),
            _ => return Err(field.invalid(field.error_msg_or(ERROR_INVALID_DATE))),
        };

        DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.date_naive())
            .ok()
            .or_else(|| parse_naive_datetime(text).map(|dt| dt.date()))
            .or_else(|| parse_ymd(text))
            .map(Value::Date)
            .ok_or_else(|| field.invalid(field.error_msg_or(ERROR_INVALID_DATE)))
    }
}

/// Date-time input accepting ISO 8601. Values are [`Value::DateTime`].
///
/// Input without an offset is interpreted in the field's default offset,
/// UTC unless configured otherwise.
#[derive(Debug, Clone)]
pub struct DateTimeField {
    offset: FixedOffset,
}

impl DateTimeField {
    /// Creates a date-time field kind with a UTC default offset.
    pub fn new() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Sets the offset applied to input without one.
    #[must_use]
    pub fn default_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        self.offset.from_local_datetime(&naive).single()
    }
}

impl Default for DateTimeField {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldType for DateTimeField {
    fn type_name(&self) -> &str {
        "datetime"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn css_class(&self) -> Option<&str> {
        Some("datetime-widget")
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::DateTime(_))
    }

    fn to_form(&self, field: &BoundField, value: &Value) -> Result<Value, Invalid> {
        let dt = match value {
            Value::DateTime(dt) => Some(*dt),
            Value::Date(date) => date.and_hms_opt(0, 0, 0).and_then(|n| self.localize(n)),
            _ => None,
        };
        dt.map(|dt| Value::Text(dt.to_rfc3339())).ok_or_else(|| {
            field
                .invalid("\"${val}\" is not a datetime object")
                .with_mapping("val", value)
        })
    }

    fn to_field(&self, field: &BoundField, value: &Value) -> Result<Value, Invalid> {
        if value.is_blank() {
            return Ok(Value::Null);
        }
        let text = match value {
            Value::DateTime(_) => return Ok(value.clone()),
            Value::Text(text) => text.trim(),
            _ => return Err(field.invalid(field.error_msg_or(ERROR_INVALID_DATE))),
        };

        DateTime::parse_from_rfc3339(text)
            .ok()
            .or_else(|| parse_naive_datetime(text).and_then(|n| self.localize(n)))
            .or_else(|| {
                parse_ymd(text)
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .and_then(|n| self.localize(n))
            })
            .map(Value::DateTime)
            .ok_or_else(|| field.invalid(field.error_msg_or(ERROR_INVALID_DATE)))
    }
}
