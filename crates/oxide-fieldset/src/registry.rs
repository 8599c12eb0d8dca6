//! Field kinds looked up by type tag.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{FormError, Result};
use crate::field::FieldType;
use crate::fields::{
    ChoiceField, DateField, DateTimeField, DecimalField, FileField, FloatField, IntegerField,
    LinesField, PasswordField, TextAreaField, TextField,
};
use crate::request::Request;

/// A map from type tag to field kind.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    kinds: HashMap<String, Arc<dyn FieldType>>,
}

impl FieldRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in kinds that need no
    /// configuration: `text`, `textarea`, `password`, `lines`, `int`,
    /// `float`, `decimal`, `date`, `datetime`, `file` and `bool`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TextField::new());
        registry.register(TextAreaField::new());
        registry.register(PasswordField::new());
        registry.register(LinesField::new());
        registry.register(IntegerField::new());
        registry.register(FloatField::new());
        registry.register(DecimalField::new());
        registry.register(DateField::new());
        registry.register(DateTimeField::new());
        registry.register(FileField::new());
        registry.register(ChoiceField::boolean());
        registry
    }

    /// Registers a kind under its own type tag, replacing any previous one.
    pub fn register(&mut self, kind: impl FieldType + 'static) {
        let kind: Arc<dyn FieldType> = Arc::new(kind);
        self.kinds.insert(kind.type_name().to_string(), kind);
    }

    /// Registers a kind under an explicit tag.
    pub fn register_as(&mut self, tag: impl Into<String>, kind: Arc<dyn FieldType>) {
        self.kinds.insert(tag.into(), kind);
    }

    /// Returns the kind registered for `tag`.
    pub fn get(&self, tag: &str) -> Option<Arc<dyn FieldType>> {
        self.kinds.get(tag).cloned()
    }

    /// Returns whether a kind is registered for `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        self.kinds.contains_key(tag)
    }
}

/// A placeholder kind resolved through the request's registry at bind time.
///
/// Binding fails with [`FormError::UnknownFieldType`] when the tag isn't
/// registered.
#[derive(Debug, Clone)]
pub struct FieldFactory {
    tag: String,
}

impl FieldFactory {
    /// Creates a factory for a type tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

impl FieldType for FieldFactory {
    fn type_name(&self) -> &str {
        &self.tag
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn resolve(&self, request: &Request) -> Result<Option<Arc<dyn FieldType>>> {
        request
            .registry
            .get(&self.tag)
            .map(Some)
            .ok_or_else(|| FormError::UnknownFieldType(self.tag.clone()))
    }
}
