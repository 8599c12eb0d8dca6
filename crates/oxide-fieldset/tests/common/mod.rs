#![allow(dead_code)]

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use oxide_fieldset::fields::{IntegerField, TextField};
use oxide_fieldset::{
    BoundField, BoundFieldset, CompositeField, Field, FieldType, Fieldset, Params, Request, Value,
    Vocabulary,
};

pub fn params(pairs: &[(&str, &str)]) -> Arc<Params> {
    Arc::new(pairs.iter().copied().collect())
}

pub fn bind(fieldset: &Fieldset, pairs: &[(&str, &str)]) -> BoundFieldset {
    fieldset
        .bind(&Request::default(), None, &params(pairs), None)
        .unwrap_or_else(|e| panic!("Failed to bind: {e}"))
}

pub fn address() -> Field {
    Field::new(
        "address",
        CompositeField::from_fields([
            Field::new("city", TextField::new()),
            Field::new("zip", IntegerField::new()),
        ])
        .unwrap_or_else(|e| panic!("Failed to build composite: {e}")),
    )
}

pub fn colors() -> Vocabulary {
    Vocabulary::from_items([
        ("r", "red", "Red"),
        ("g", "green", "Green"),
        ("b", "blue", "Blue"),
    ])
    .unwrap_or_else(|e| panic!("Failed to build vocabulary: {e}"))
}

/// A text kind counting how often its raw value is read.
#[derive(Debug, Clone, Default)]
pub struct CountingField {
    pub reads: Arc<AtomicUsize>,
}

impl CountingField {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl FieldType for CountingField {
    fn type_name(&self) -> &str {
        "counting"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn missing(&self) -> Value {
        Value::from("")
    }

    fn extract(&self, field: &BoundField) -> Value {
        self.reads.fetch_add(1, Ordering::SeqCst);
        field.extract_param()
    }
}
