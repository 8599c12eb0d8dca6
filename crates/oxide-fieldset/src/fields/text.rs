//! Text field types.

use std::any::Any;

use crate::error::Invalid;
use crate::field::{BoundField, FieldType, Widget};
use crate::value::Value;

/// Single line text input. Type tag `text`.
#[derive(Debug, Clone, Default)]
pub struct TextField;

impl TextField {
    /// Creates a text field kind.
    pub fn new() -> Self {
        Self
    }
}

impl FieldType for TextField {
    fn type_name(&self) -> &str {
        "text"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn missing(&self) -> Value {
        Value::from("")
    }

    fn css_class(&self) -> Option<&str> {
        Some("text-widget")
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Text(_))
    }
}

/// Password input. Type tag `password`.
#[derive(Debug, Clone, Default)]
pub struct PasswordField;

impl PasswordField {
    /// Creates a password field kind.
    pub fn new() -> Self {
        Self
    }
}

impl FieldType for PasswordField {
    fn type_name(&self) -> &str {
        "password"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn missing(&self) -> Value {
        Value::from("")
    }

    fn css_class(&self) -> Option<&str> {
        Some("password-widget")
    }

    fn widget(&self) -> Widget {
        Widget::Input {
            html_type: "password",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Text(_))
    }
}

/// Multi-line text area. Type tag `textarea`.
#[derive(Debug, Clone)]
pub struct TextAreaField {
    rows: usize,
    cols: usize,
}

impl TextAreaField {
    /// Creates a text area with 5 rows and 40 columns.
    pub fn new() -> Self {
        Self { rows: 5, cols: 40 }
    }

    /// Sets the number of rows.
    #[must_use]
    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// Sets the number of columns.
    #[must_use]
    pub fn cols(mut self, cols: usize) -> Self {
        self.cols = cols;
        self
    }
}

impl Default for TextAreaField {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldType for TextAreaField {
    fn type_name(&self) -> &str {
        "textarea"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn missing(&self) -> Value {
        Value::from("")
    }

    fn css_class(&self) -> Option<&str> {
        Some("textarea-widget")
    }

    fn widget(&self) -> Widget {
        Widget::TextArea {
            rows: self.rows,
            cols: self.cols,
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Text(_))
    }
}

/// Text area whose lines form a list of strings. Type tag `lines`.
///
/// Blank lines are dropped and every entry is trimmed.
#[derive(Debug, Clone)]
pub struct LinesField {
    area: TextAreaField,
}

impl LinesField {
    /// Creates a lines field kind.
    pub fn new() -> Self {
        Self {
            area: TextAreaField::new(),
        }
    }

    /// Sets the number of rows.
    #[must_use]
    pub fn rows(mut self, rows: usize) -> Self {
        self.area = self.area.rows(rows);
        self
    }
}

impl Default for LinesField {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldType for LinesField {
    fn type_name(&self) -> &str {
        "lines"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn css_class(&self) -> Option<&str> {
        Some("textlines-widget")
    }

    fn widget(&self) -> Widget {
        self.area.widget()
    }

    fn accepts(&self, value: &Value) -> bool {
        value
            .as_list()
            .is_some_and(|items| items.iter().all(|v| matches!(v, Value::Text(_))))
    }

    fn to_form(&self, field: &BoundField, value: &Value) -> Result<Value, Invalid> {
        match value {
            Value::List(items) => Ok(Value::Text(
                items
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            )),
            Value::Text(_) => Ok(value.clone()),
            _ => Err(field
                .invalid(field.error_msg_or("\"${val}\" is not a list"))
                .with_mapping("val", value)),
        }
    }

    fn to_field(&self, field: &BoundField, value: &Value) -> Result<Value, Invalid> {
        if value.is_blank() {
            return Ok(Value::Null);
        }
        match value {
            Value::Text(text) => Ok(Value::List(
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(Value::from)
                    .collect(),
            )),
            Value::List(_) => Ok(value.clone()),
            _ => Err(field
                .invalid(field.error_msg_or("\"${val}\" is not a list"))
                .with_mapping("val", value)),
        }
    }
}
