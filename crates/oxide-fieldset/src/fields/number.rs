//! Numeric field types.
//!
//! All three kinds render as a text input, convert blank input to
//! [`Value::Null`] and report unparsable input as `"${val}" is not a number`.

use std::any::Any;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::Invalid;
use crate::field::{BoundField, FieldType};
use crate::value::Value;

const ERROR_NOT_A_NUMBER: &str = "\"${val}\" is not a number";

fn not_a_number(field: &BoundField, value: &Value) -> Invalid {
    field
        .invalid(field.error_msg_or(ERROR_NOT_A_NUMBER))
        .with_mapping("val", value)
}

/// Parses wire text with `parse`, passing already typed values through.
fn parse_number<T, F>(field: &BoundField, value: &Value, typed: F) -> Result<Value, Invalid>
where
    T: FromStr,
    F: Fn(&Value) -> Option<T>,
    Value: From<T>,
{
    if value.is_blank() {
        return Ok(Value::Null);
    }
    if let Some(n) = typed(value) {
        return Ok(Value::from(n));
    }
    value
        .as_str()
        .and_then(|text| text.trim().parse::<T>().ok())
        .map(Value::from)
        .ok_or_else(|| not_a_number(field, value))
}

/// Integer input. Type tag `int`.
#[derive(Debug, Clone, Default)]
pub struct IntegerField;

impl IntegerField {
    /// Creates an integer field kind.
    pub fn new() -> Self {
        Self
    }
}

impl FieldType for IntegerField {
    fn type_name(&self) -> &str {
        "int"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn css_class(&self) -> Option<&str> {
        Some("int-widget")
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Int(_))
    }

    fn to_form(&self, field: &BoundField, value: &Value) -> Result<Value, Invalid> {
        parse_number::<i64, _>(field, value, |v| match v {
            Value::Int(n) => Some(*n),
            _ => None,
        })
        .map(|v| Value::Text(v.to_string()))
    }

    fn to_field(&self, field: &BoundField, value: &Value) -> Result<Value, Invalid> {
        parse_number::<i64, _>(field, value, |v| match v {
            Value::Int(n) => Some(*n),
            _ => None,
        })
    }
}

/// Float input. Type tag `float`.
#[derive(Debug, Clone, Default)]
pub struct FloatField;

impl FloatField {
    /// Creates a float field kind.
    pub fn new() -> Self {
        Self
    }
}

impl FieldType for FloatField {
    fn type_name(&self) -> &str {
        "float"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn css_class(&self) -> Option<&str> {
        Some("float-widget")
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Float(_))
    }

    fn to_form(&self, field: &BoundField, value: &Value) -> Result<Value, Invalid> {
        self.to_field(field, value)
            .map(|v| Value::Text(v.to_string()))
    }

    fn to_field(&self, field: &BoundField, value: &Value) -> Result<Value, Invalid> {
        parse_number::<f64, _>(field, value, |v| match v {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        })
    }
}

/// Fixed-point decimal input. Type tag `decimal`.
#[derive(Debug, Clone, Default)]
pub struct DecimalField;

impl DecimalField {
    /// Creates a decimal field kind.
    pub fn new() -> Self {
        Self
    }
}

impl FieldType for DecimalField {
    fn type_name(&self) -> &str {
        "decimal"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn css_class(&self) -> Option<&str> {
        Some("decimal-widget")
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Decimal(_))
    }

    fn to_form(&self, field: &BoundField, value: &Value) -> Result<Value, Invalid> {
        self.to_field(field, value)
            .map(|v| Value::Text(v.to_string()))
    }

    fn to_field(&self, field: &BoundField, value: &Value) -> Result<Value, Invalid> {
        parse_number::<Decimal, _>(field, value, |v| match v {
            Value::Decimal(d) => Some(*d),
            Value::Int(n) => Some(Decimal::from(*n)),
            _ => None,
        })
    }
}
