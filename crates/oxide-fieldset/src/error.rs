//! Error types for fields and forms.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

/// Message used when a required field has no usable value.
pub const ERROR_REQUIRED: &str = "Required";

/// Message used when a value violates a field's type constraint.
pub const ERROR_WRONG_TYPE: &str = "Wrong type";

/// Configuration and other unrecoverable errors.
///
/// These are raised while declaring fields or handling a request as a whole;
/// per-field problems are reported as [`Invalid`] values instead.
#[derive(Debug, Error)]
pub enum FormError {
    /// A field or fieldset with this name already exists at this level.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// A composite field was declared without children.
    #[error("fields are required for composite field {0:?}")]
    EmptyComposite(String),

    /// A composite field was declared with a nested fieldset among its
    /// children.
    #[error("composite field {0:?} can't contain fieldset {1:?}")]
    NestedFieldset(String, String),

    /// A vocabulary contains the same token twice.
    #[error("duplicate vocabulary token: {0}")]
    DuplicateToken(String),

    /// No field implementation is registered for a type tag.
    #[error("can't find field implementation for {0:?}")]
    UnknownFieldType(String),

    /// No bound field has this name.
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// A button was activated that has no action.
    #[error("action is not specified for button {0:?}")]
    NoAction(String),

    /// The form authenticator is missing or does not match.
    #[error("form authenticator is not found")]
    Forbidden,

    /// Submitted data could not be parsed.
    #[error("failed to parse form data: {0}")]
    ParseError(String),

    /// A validator pattern failed to compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;

/// A recoverable conversion or validation failure for one field.
///
/// `msg` may contain `${key}` placeholders which are filled from `mapping`
/// when the error is displayed. `field` holds the resolved (prefixed) name
/// of the field that raised the error, or `None` for form-level errors.
/// Sub-errors are keyed by their `name`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invalid {
    /// Message template.
    pub msg: String,
    /// Resolved name of the originating field.
    pub field: Option<String>,
    /// Interpolation values for the message.
    pub mapping: IndexMap<String, String>,
    /// Key this error is filed under.
    pub name: Option<String>,
    /// Sub-errors keyed by name.
    pub errors: IndexMap<String, Invalid>,
}

impl Invalid {
    /// Creates an error with a message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            ..Self::default()
        }
    }

    /// Sets the originating field.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Adds an interpolation value.
    #[must_use]
    pub fn with_mapping(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.mapping.insert(key.into(), value.to_string());
        self
    }

    /// Sets the name this error is filed under.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds sub-errors, keyed by their names.
    ///
    /// A sub-error without a name is keyed by its position.
    #[must_use]
    pub fn with_errors(mut self, errors: impl IntoIterator<Item = Invalid>) -> Self {
        for error in errors {
            let key = error
                .name
                .clone()
                .unwrap_or_else(|| self.errors.len().to_string());
            self.insert(key, error);
        }
        self
    }

    /// Returns the message with placeholders interpolated.
    pub fn message(&self) -> String {
        self.mapping
            .iter()
            .fold(self.msg.clone(), |msg, (key, value)| {
                msg.replace(&format!("${{{key}}}"), value)
            })
    }

    /// Returns the sub-error filed under `name`.
    pub fn get(&self, name: &str) -> Option<&Invalid> {
        self.errors.get(name)
    }

    /// Returns whether a sub-error is filed under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.errors.contains_key(name)
    }

    /// Files a sub-error under `name`, renaming it accordingly.
    pub fn insert(&mut self, name: impl Into<String>, mut error: Invalid) {
        let name = name.into();
        error.name = Some(name.clone());
        self.errors.insert(name, error);
    }

    /// Fills in the originating field and name when they are not set yet.
    #[must_use]
    pub fn tagged(mut self, field: &str, name: &str) -> Self {
        if self.field.is_none() {
            self.field = Some(field.to_string());
        }
        if self.name.is_none() {
            self.name = Some(name.to_string());
        }
        self
    }

    /// Returns the leaf errors of this error tree in order.
    ///
    /// An error without sub-errors is its own leaf.
    pub fn leaves(&self) -> Vec<&Invalid> {
        if self.errors.is_empty() {
            return vec![self];
        }
        self.errors.values().flat_map(Invalid::leaves).collect()
    }
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.msg.is_empty() && !self.errors.is_empty() {
            let parts: Vec<String> = self
                .errors
                .iter()
                .map(|(name, err)| format!("{name}: {err}"))
                .collect();
            return f.write_str(&parts.join("; "));
        }
        f.write_str(&self.message())
    }
}

impl std::error::Error for Invalid {}

impl std::ops::Index<&str> for Invalid {
    type Output = Invalid;

    fn index(&self, name: &str) -> &Self::Output {
        &self.errors[name]
    }
}

impl From<&str> for Invalid {
    fn from(msg: &str) -> Self {
        Self::new(msg)
    }
}

impl From<String> for Invalid {
    fn from(msg: String) -> Self {
        Self::new(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let err = Invalid::default();
        assert_eq!(err.msg, "");
        assert!(err.field.is_none());
        assert!(err.mapping.is_empty());
        assert!(err.name.is_none());
        assert!(err.errors.is_empty());
    }

    #[test]
    fn test_ctor() {
        let sub = Invalid::new("suberr").with_name("serror");
        let err = Invalid::new("test")
            .with_field("form.name")
            .with_mapping("1", "2")
            .with_name("err_name")
            .with_errors([sub.clone()]);

        assert_eq!(err.msg, "test");
        assert_eq!(err.field.as_deref(), Some("form.name"));
        assert_eq!(err.mapping.get("1").map(String::as_str), Some("2"));
        assert_eq!(err.name.as_deref(), Some("err_name"));
        assert_eq!(err.get("serror"), Some(&sub));
    }

    #[test]
    fn test_interpolation() {
        let err = Invalid::new("${val} message").with_mapping("val", "Error");
        assert_eq!(err.to_string(), "Error message");

        let err = Invalid::new("${val} message");
        assert_eq!(err.to_string(), "${val} message");
    }

    #[test]
    fn test_insert_renames() {
        let mut err = Invalid::default();
        err.insert("test", Invalid::new("sub"));

        assert!(err.contains("test"));
        assert_eq!(err["test"].name.as_deref(), Some("test"));
    }

    #[test]
    fn test_tagged_keeps_origin() {
        let err = Invalid::new("bad")
            .with_field("address.city")
            .tagged("address", "address");
        assert_eq!(err.field.as_deref(), Some("address.city"));
        assert_eq!(err.name.as_deref(), Some("address"));
    }

    #[test]
    fn test_aggregate_display_and_leaves() {
        let err = Invalid::default().with_errors([
            Invalid::new(ERROR_REQUIRED).with_name("city"),
            Invalid::new(ERROR_REQUIRED).with_name("zip"),
        ]);
        assert_eq!(err.to_string(), "city: Required; zip: Required");
        assert_eq!(err.leaves().len(), 2);
    }

    #[test]
    fn test_form_error_display() {
        let err = FormError::UnknownFieldType("custom".to_string());
        assert_eq!(err.to_string(), r#"can't find field implementation for "custom""#);
    }
}
