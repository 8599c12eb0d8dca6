//! Field validators.
//!
//! A validator runs after a field's built-in required and type checks and
//! reports domain rule violations as [`Invalid`] values. Any closure
//! `Fn(&BoundField, &Value) -> Result<(), Invalid>` is a validator.
//!
//! The stock validators skip absent values; whether a value is present at
//! all is the field's `required` flag's business.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{Invalid, Result, ERROR_WRONG_TYPE};
use crate::field::BoundField;
use crate::value::Value;

/// Trait for field validators.
pub trait Validator: Send + Sync {
    /// Validates a typed value of `field`.
    fn validate(&self, field: &BoundField, value: &Value) -> std::result::Result<(), Invalid>;
}

impl<F> Validator for F
where
    F: Fn(&BoundField, &Value) -> std::result::Result<(), Invalid> + Send + Sync,
{
    fn validate(&self, field: &BoundField, value: &Value) -> std::result::Result<(), Invalid> {
        self(field, value)
    }
}

/// Runs several validators and reports all of their failures.
///
/// A single failure is returned unchanged; several are joined into one
/// error whose message lists every message and whose sub-errors are the
/// individual failures.
#[derive(Clone, Default)]
pub struct All {
    validators: Vec<Arc<dyn Validator>>,
}

impl All {
    /// Creates an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a validator.
    #[must_use]
    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }
}

impl Validator for All {
    fn validate(&self, field: &BoundField, value: &Value) -> std::result::Result<(), Invalid> {
        join_errors(
            self.validators
                .iter()
                .filter_map(|v| v.validate(field, value).err())
                .collect(),
        )
    }
}

/// Folds validator failures into one result the way [`All`] reports them.
pub(crate) fn join_errors(mut errors: Vec<Invalid>) -> std::result::Result<(), Invalid> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => {
            let msg = errors
                .iter()
                .map(Invalid::message)
                .collect::<Vec<_>>()
                .join("; ");
            Err(Invalid::new(msg).with_errors(errors))
        }
    }
}

/// Validator backed by a predicate over the value.
pub struct Function<F> {
    func: F,
    message: String,
}

impl<F> Function<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    /// Creates a new predicate validator. `${val}` in the message is
    /// replaced with the rejected value.
    pub fn new(func: F, message: impl Into<String>) -> Self {
        Self {
            func,
            message: message.into(),
        }
    }
}

impl<F> Validator for Function<F>
where
    F: Fn(&Value) -> bool + Send + Sync,
{
    fn validate(&self, _field: &BoundField, value: &Value) -> std::result::Result<(), Invalid> {
        if (self.func)(value) {
            Ok(())
        } else {
            Err(Invalid::new(self.message.clone()).with_mapping("val", value))
        }
    }
}

/// Validator using a custom regex pattern.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    pattern: Regex,
    message: String,
}

impl RegexValidator {
    /// Creates a new RegexValidator.
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            message: message.into(),
        })
    }
}

impl Validator for RegexValidator {
    fn validate(&self, _field: &BoundField, value: &Value) -> std::result::Result<(), Invalid> {
        if value.is_absent() {
            return Ok(());
        }
        if self.pattern.is_match(&value.to_string()) {
            Ok(())
        } else {
            Err(Invalid::new(self.message.clone()).with_mapping("val", value))
        }
    }
}

static EMAIL_RE: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"));

/// Validator for email addresses.
#[derive(Debug, Clone)]
pub struct EmailValidator {
    message: String,
}

impl EmailValidator {
    /// Creates a new EmailValidator with default message.
    pub fn new() -> Self {
        Self {
            message: "Invalid email address".to_string(),
        }
    }

    /// Creates a new EmailValidator with custom message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for EmailValidator {
    fn validate(&self, _field: &BoundField, value: &Value) -> std::result::Result<(), Invalid> {
        if value.is_absent() {
            return Ok(());
        }
        let text = value.to_string();
        let valid = EMAIL_RE.as_ref().is_ok_and(|re| re.is_match(&text));
        if valid {
            Ok(())
        } else {
            Err(Invalid::new(self.message.clone()).with_mapping("val", &text))
        }
    }
}

/// Validator for http(s) URLs.
#[derive(Debug, Clone)]
pub struct UrlValidator {
    message: String,
}

impl UrlValidator {
    /// Creates a new UrlValidator with default message.
    pub fn new() -> Self {
        Self {
            message: "Invalid URL".to_string(),
        }
    }

    /// Creates a new UrlValidator with custom message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator for UrlValidator {
    fn validate(&self, _field: &BoundField, value: &Value) -> std::result::Result<(), Invalid> {
        if value.is_absent() {
            return Ok(());
        }
        let text = value.to_string();
        let host = text
            .strip_prefix("http://")
            .or_else(|| text.strip_prefix("https://"));
        match host {
            Some(rest) if !rest.is_empty() && !rest.starts_with('/') => Ok(()),
            _ => Err(Invalid::new(self.message.clone()).with_mapping("val", &text)),
        }
    }
}

/// Validator for a numeric range, bounds inclusive.
#[derive(Debug, Clone)]
pub struct RangeValidator {
    min: Option<f64>,
    max: Option<f64>,
    message: String,
}

impl RangeValidator {
    /// Creates a new RangeValidator with min and max bounds.
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        let message = match (min, max) {
            (Some(_), Some(_)) => "${val} is not between ${min} and ${max}",
            (Some(_), None) => "${val} is less than minimum value ${min}",
            (None, Some(_)) => "${val} is greater than maximum value ${max}",
            (None, None) => "Invalid value",
        };
        Self::with_message(min, max, message)
    }

    /// Creates a new RangeValidator with custom message.
    pub fn with_message(min: Option<f64>, max: Option<f64>, message: impl Into<String>) -> Self {
        Self {
            min,
            max,
            message: message.into(),
        }
    }

    fn error(&self, value: &Value) -> Invalid {
        let mut err = Invalid::new(self.message.clone()).with_mapping("val", value);
        if let Some(min) = self.min {
            err = err.with_mapping("min", min);
        }
        if let Some(max) = self.max {
            err = err.with_mapping("max", max);
        }
        err
    }
}

impl Validator for RangeValidator {
    fn validate(&self, _field: &BoundField, value: &Value) -> std::result::Result<(), Invalid> {
        let num = match value {
            Value::Null | Value::Required => return Ok(()),
            Value::Int(n) => *n as f64,
            Value::Float(n) => *n,
            Value::Decimal(d) => d.to_f64().ok_or_else(|| Invalid::new(ERROR_WRONG_TYPE))?,
            _ => return Err(Invalid::new(ERROR_WRONG_TYPE)),
        };

        if self.min.is_some_and(|min| num < min) || self.max.is_some_and(|max| num > max) {
            return Err(self.error(value));
        }
        Ok(())
    }
}

/// Validator for the length of text or the number of list items.
#[derive(Debug, Clone)]
pub struct LengthValidator {
    min: Option<usize>,
    max: Option<usize>,
}

impl LengthValidator {
    /// Creates a new LengthValidator.
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self { min, max }
    }
}

impl Validator for LengthValidator {
    fn validate(&self, _field: &BoundField, value: &Value) -> std::result::Result<(), Invalid> {
        let len = match value {
            Value::Null | Value::Required => return Ok(()),
            Value::Text(s) => s.chars().count(),
            Value::List(items) => items.len(),
            Value::Map(map) => map.len(),
            _ => return Err(Invalid::new(ERROR_WRONG_TYPE)),
        };

        if let Some(min) = self.min.filter(|&min| len < min) {
            return Err(Invalid::new("Shorter than minimum length ${min}").with_mapping("min", min));
        }
        if let Some(max) = self.max.filter(|&max| len > max) {
            return Err(Invalid::new("Longer than maximum length ${max}").with_mapping("max", max));
        }
        Ok(())
    }
}

/// Validator requiring the value to be one of a fixed set.
#[derive(Debug, Clone)]
pub struct OneOfValidator {
    choices: Vec<Value>,
}

impl OneOfValidator {
    /// Creates a new OneOfValidator.
    pub fn new<V: Into<Value>>(choices: impl IntoIterator<Item = V>) -> Self {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for OneOfValidator {
    fn validate(&self, _field: &BoundField, value: &Value) -> std::result::Result<(), Invalid> {
        if value.is_absent() || self.choices.contains(value) {
            return Ok(());
        }
        let choices = self
            .choices
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Err(Invalid::new("\"${val}\" is not one of ${choices}")
            .with_mapping("val", value)
            .with_mapping("choices", choices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::fields::TextField;
    use crate::params::Params;
    use crate::request::Request;

    fn bound() -> BoundField {
        Field::new("test", TextField::new())
            .bind(
                &Request::default(),
                "",
                Value::Null,
                &Arc::new(Params::new()),
                None,
            )
            .unwrap()
    }

    #[test]
    fn test_email_validator() {
        let field = bound();
        let v = EmailValidator::new();
        assert!(v.validate(&field, &"user@example.com".into()).is_ok());
        assert!(v.validate(&field, &"user.name@domain.co.uk".into()).is_ok());
        assert!(v.validate(&field, &"invalid".into()).is_err());
        assert!(v.validate(&field, &"@example.com".into()).is_err());
        assert!(v.validate(&field, &Value::Null).is_ok());
    }

    #[test]
    fn test_url_validator() {
        let field = bound();
        let v = UrlValidator::new();
        assert!(v.validate(&field, &"https://example.com".into()).is_ok());
        assert!(v.validate(&field, &"http://example.com/path".into()).is_ok());
        assert!(v.validate(&field, &"example.com".into()).is_err());
        assert!(v.validate(&field, &"http://".into()).is_err());
    }

    #[test]
    fn test_regex_validator() {
        let field = bound();
        let v = RegexValidator::new(r"^\d{4}-\d{2}-\d{2}$", "Enter a valid date.").unwrap();
        assert!(v.validate(&field, &"2024-01-15".into()).is_ok());
        assert!(v.validate(&field, &"not a date".into()).is_err());
    }

    #[test]
    fn test_regex_validator_bad_pattern() {
        assert!(RegexValidator::new(r"(unclosed", "msg").is_err());
    }

    #[test]
    fn test_range_validator() {
        let field = bound();
        let v = RangeValidator::new(Some(0.0), Some(100.0));
        assert!(v.validate(&field, &Value::Int(50)).is_ok());
        assert!(v.validate(&field, &Value::Int(0)).is_ok());
        assert!(v.validate(&field, &Value::Float(100.0)).is_ok());

        let err = v.validate(&field, &Value::Int(101)).unwrap_err();
        assert_eq!(err.to_string(), "101 is not between 0 and 100");
        assert!(v.validate(&field, &Value::Int(-1)).is_err());
    }

    #[test]
    fn test_length_validator() {
        let field = bound();
        let v = LengthValidator::new(Some(2), Some(5));
        assert!(v.validate(&field, &"hello".into()).is_ok());
        assert!(v.validate(&field, &"h".into()).is_err());
        assert_eq!(
            v.validate(&field, &"hello world".into())
                .unwrap_err()
                .to_string(),
            "Longer than maximum length 5"
        );
        assert!(v
            .validate(&field, &Value::List(vec![Value::Int(1)]))
            .is_err());
    }

    #[test]
    fn test_one_of_validator() {
        let field = bound();
        let v = OneOfValidator::new(["red", "green"]);
        assert!(v.validate(&field, &"red".into()).is_ok());
        assert_eq!(
            v.validate(&field, &"blue".into()).unwrap_err().to_string(),
            r#""blue" is not one of red, green"#
        );
    }

    #[test]
    fn test_function_validator() {
        let field = bound();
        let v = Function::new(|value: &Value| value.as_str() != Some("bad"), "${val} rejected");
        assert!(v.validate(&field, &"good".into()).is_ok());
        assert_eq!(
            v.validate(&field, &"bad".into()).unwrap_err().to_string(),
            "bad rejected"
        );
    }

    #[test]
    fn test_all_validator() {
        let field = bound();
        let v = All::new()
            .with(LengthValidator::new(Some(20), None))
            .with(EmailValidator::new());

        let err = v.validate(&field, &"nope".into()).unwrap_err();
        assert_eq!(
            err.message(),
            "Shorter than minimum length 20; Invalid email address"
        );
        assert_eq!(err.errors.len(), 2);

        let err = v.validate(&field, &"someone@example.com".into()).unwrap_err();
        assert_eq!(err.message(), "Shorter than minimum length 20");
        assert!(err.errors.is_empty());
    }
}
