//! File upload field type.

use std::any::Any;

use crate::error::Invalid;
use crate::field::{BoundField, FieldType, Widget};
use crate::params::Param;
use crate::value::{Upload, Value};

/// File input. Type tag `file`.
///
/// Accepts a multipart upload, or raw text content with the file name and
/// mime type submitted as `<name>-filename` and `<name>-mimetype`.
#[derive(Debug, Clone, Default)]
pub struct FileField {
    max_size: usize,
    allowed_types: Vec<String>,
}

impl FileField {
    /// Creates a file field kind without size or type limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum size in bytes; zero disables the check.
    #[must_use]
    pub fn max_size(mut self, bytes: usize) -> Self {
        self.max_size = bytes;
        self
    }

    /// Restricts uploads to the given mime types.
    #[must_use]
    pub fn allowed_types<S: Into<String>>(mut self, types: impl IntoIterator<Item = S>) -> Self {
        self.allowed_types = types.into_iter().map(Into::into).collect();
        self
    }
}

impl FieldType for FileField {
    fn type_name(&self) -> &str {
        "file"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn css_class(&self) -> Option<&str> {
        Some("input-file")
    }

    fn widget(&self) -> Widget {
        Widget::Input { html_type: "file" }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::File(_))
    }

    fn extract(&self, field: &BoundField) -> Value {
        match field.params.get(&field.name) {
            Some(Param::File(upload)) => Value::File(upload.clone()),
            Some(Param::Text(content)) if !content.is_empty() => {
                let param = |suffix: &str| {
                    field
                        .params
                        .get_str(&format!("{}-{suffix}", field.name))
                        .unwrap_or_default()
                        .to_string()
                };
                Value::File(Upload::new(
                    param("filename"),
                    param("mimetype"),
                    content.as_bytes(),
                ))
            }
            _ => Value::Null,
        }
    }

    fn validate(&self, field: &BoundField, value: &Value) -> Result<(), Invalid> {
        field.validate_base(value)?;

        let Some(upload) = value.as_file() else {
            return Ok(());
        };

        if self.max_size > 0 && upload.size() > self.max_size {
            return Err(field.invalid("Maximum file size exceeded."));
        }

        if !self.allowed_types.is_empty() && !self.allowed_types.contains(&upload.mimetype) {
            return Err(field.invalid("Unknown file type."));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::field::Field;
    use crate::params::Params;
    use crate::request::Request;

    fn bind(field: Field, params: Params) -> BoundField {
        field
            .bind(&Request::default(), "", Value::Null, &Arc::new(params), None)
            .unwrap()
    }

    #[test]
    fn test_extract_upload() {
        let upload = Upload::new("a.txt", "text/plain", "hello");
        let bound = bind(
            Field::new("doc", FileField::new()),
            Params::new().with("doc", upload.clone()),
        );
        assert_eq!(bound.extract(), Value::File(upload));
    }

    #[test]
    fn test_extract_raw_content() {
        let bound = bind(
            Field::new("doc", FileField::new()),
            Params::new()
                .with("doc", "content")
                .with("doc-filename", "notes.txt")
                .with("doc-mimetype", "text/plain"),
        );
        let value = bound.extract();
        let upload = value.as_file().unwrap();
        assert_eq!(upload.filename, "notes.txt");
        assert_eq!(upload.mimetype, "text/plain");
        assert_eq!(upload.size(), 7);

        let bound = bind(Field::new("doc", FileField::new()), Params::new());
        assert_eq!(bound.extract(), Value::Null);
    }

    #[test]
    fn test_validate_limits() {
        let bound = bind(
            Field::new(
                "doc",
                FileField::new().max_size(4).allowed_types(["image/png"]),
            ),
            Params::new(),
        );

        let big = Value::File(Upload::new("a.png", "image/png", "12345"));
        assert_eq!(
            bound.validate(&big).unwrap_err().to_string(),
            "Maximum file size exceeded."
        );

        let text = Value::File(Upload::new("a.txt", "text/plain", "1"));
        assert_eq!(
            bound.validate(&text).unwrap_err().to_string(),
            "Unknown file type."
        );

        let ok = Value::File(Upload::new("a.png", "image/png", "1"));
        assert!(bound.validate(&ok).is_ok());
    }

    #[test]
    fn test_validate_required() {
        let bound = bind(Field::new("doc", FileField::new()), Params::new());
        assert_eq!(
            bound.validate(&Value::Null).unwrap_err().to_string(),
            "Required"
        );
    }
}
