//! Typed field values and the "no value" sentinels.
//!
//! Every value that flows through a field, from the raw wire representation
//! read out of the submitted parameters to the typed value stored in the
//! extracted data, is a [`Value`]. Two variants are sentinels rather than
//! data:
//!
//! - [`Value::Null`]: the caller supplied nothing for this slot. Returned by
//!   extraction when a parameter is absent, used as "no default", and
//!   returned by coercion when there was nothing to coerce.
//! - [`Value::Required`]: a field's `missing` policy meaning "absence is an
//!   error". A value equal to this sentinel after extraction always fails
//!   validation with a `Required` error.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;

/// Extracted data: an insertion-ordered mapping of local field name to value.
pub type Data = IndexMap<String, Value>;

/// An uploaded file as seen by a [`FileField`](crate::fields::FileField).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Upload {
    /// Client-side file name.
    pub filename: String,
    /// Declared mime type.
    pub mimetype: String,
    /// File contents.
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl Upload {
    /// Creates a new upload.
    pub fn new(
        filename: impl Into<String>,
        mimetype: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            mimetype: mimetype.into(),
            data: data.into(),
        }
    }

    /// Returns the size of the contents in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A field value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// No value was supplied.
    #[default]
    Null,
    /// Missing-value policy: absence is an error.
    Required,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Fixed-point decimal value.
    Decimal(Decimal),
    /// Text value.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time with a fixed UTC offset.
    DateTime(DateTime<FixedOffset>),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Nested mapping, produced by composite fields and nested fieldsets.
    Map(Data),
    /// Uploaded file.
    File(Upload),
}

impl Value {
    /// Returns true for the [`Value::Null`] sentinel.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for the [`Value::Required`] sentinel.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }

    /// Returns true for either sentinel.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Null | Self::Required)
    }

    /// Returns true for values that carry nothing to coerce: either sentinel,
    /// empty text, an empty list or an empty mapping.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null | Self::Required => true,
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Returns the text if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items if this is a list value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the mapping if this is a map value.
    pub fn as_map(&self) -> Option<&Data> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the upload if this is a file value.
    pub fn as_file(&self) -> Option<&Upload> {
        match self {
            Self::File(upload) => Some(upload),
            _ => None,
        }
    }

    /// Returns the name of this value's variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Required => "required",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::File(_) => "file",
        }
    }

    /// Looks up a key when this is a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null | Self::Required => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Self::File(upload) => f.write_str(&upload.filename),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::DateTime(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<Data> for Value {
    fn from(value: Data) -> Self {
        Self::Map(value)
    }
}

impl From<Upload> for Value {
    fn from(value: Upload) -> Self {
        Self::File(value)
    }
}
