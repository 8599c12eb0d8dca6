//! Vocabulary-backed choice field types.
//!
//! Choice fields submit term tokens and store term values. The vocabulary is
//! either fixed at declaration or produced per request by a factory called
//! with the bind context.
//!
//! Every lookup failure becomes an [`Invalid`] embedding the offending
//! token or value; a multi-choice field fails as a whole when any one of its
//! tokens is unknown.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{Invalid, Result};
use crate::field::{BoundField, ChoiceItem, Context, FieldType, Widget};
use crate::params::Param;
use crate::request::Request;
use crate::value::Value;
use crate::vocabulary::{LookupError, Vocabulary};

/// Token submitted by the "no selection" option.
pub const NO_VALUE_TOKEN: &str = "--NOVALUE--";

const ERROR_NOT_IN_VOCABULARY: &str = "\"${val}\" is not in vocabulary";

/// Builds a vocabulary for one request.
pub type VocabularyFactory = Arc<dyn Fn(Option<&Context>) -> Vocabulary + Send + Sync>;

/// Where a choice field gets its vocabulary from.
#[derive(Clone)]
pub enum VocabularySource {
    /// The same vocabulary for every request.
    Fixed(Arc<Vocabulary>),
    /// A vocabulary built at bind time from the context.
    Factory(VocabularyFactory),
}

impl VocabularySource {
    fn resolve(&self, context: Option<&Context>) -> Arc<Vocabulary> {
        match self {
            Self::Fixed(vocabulary) => Arc::clone(vocabulary),
            Self::Factory(factory) => Arc::new(factory(context)),
        }
    }
}

impl fmt::Debug for VocabularySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(vocabulary) => f.debug_tuple("Fixed").field(vocabulary).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl From<Vocabulary> for VocabularySource {
    fn from(vocabulary: Vocabulary) -> Self {
        Self::Fixed(Arc::new(vocabulary))
    }
}

impl From<Arc<Vocabulary>> for VocabularySource {
    fn from(vocabulary: Arc<Vocabulary>) -> Self {
        Self::Fixed(vocabulary)
    }
}

fn not_in_vocabulary(field: &BoundField, val: impl ToString) -> Invalid {
    field
        .invalid(field.error_msg_or(ERROR_NOT_IN_VOCABULARY))
        .with_mapping("val", val)
}

/// Converts a submitted token, or an already typed term value, to the
/// term value.
fn token_to_value(field: &BoundField, value: &Value) -> std::result::Result<Value, Invalid> {
    let Some(vocabulary) = field.vocabulary.as_deref() else {
        return Err(not_in_vocabulary(field, value));
    };
    let found = match value {
        Value::Text(token) => vocabulary.get_value(token).cloned(),
        other => vocabulary.get_term(other).map(|term| term.value.clone()),
    };
    found.map_err(|err| match err {
        LookupError::Token(token) => not_in_vocabulary(field, token),
        LookupError::Value(value) => not_in_vocabulary(field, value),
    })
}

fn value_to_token(field: &BoundField, value: &Value) -> std::result::Result<String, Invalid> {
    field
        .vocabulary
        .as_deref()
        .and_then(|vocabulary| vocabulary.get_term(value).ok())
        .map(|term| term.token.clone())
        .ok_or_else(|| not_in_vocabulary(field, value))
}

fn build_items(field: &BoundField, checked: impl Fn(&str) -> bool) -> Vec<ChoiceItem> {
    field
        .vocabulary
        .iter()
        .flat_map(|vocabulary| vocabulary.iter())
        .enumerate()
        .map(|(count, term)| ChoiceItem {
            id: format!("{}-{count}", field.id),
            name: field.name.clone(),
            value: term.token.clone(),
            label: term.label().to_string(),
            description: term.description.clone(),
            checked: checked(&term.token),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChoiceStyle {
    Select,
    Radio,
    Bool,
}

/// Single choice over a vocabulary.
///
/// Renders as a select (type tag `choice`), radio buttons (`radio`) or a
/// yes/no radio pair (`bool`). An optional select gets a leading prompt
/// option submitting [`NO_VALUE_TOKEN`].
#[derive(Debug, Clone)]
pub struct ChoiceField {
    source: VocabularySource,
    style: ChoiceStyle,
    prompt: String,
}

impl ChoiceField {
    fn with_style(source: VocabularySource, style: ChoiceStyle) -> Self {
        Self {
            source,
            style,
            prompt: "select a value ...".to_string(),
        }
    }

    /// Creates a select field over a vocabulary.
    pub fn new(vocabulary: impl Into<VocabularySource>) -> Self {
        Self::with_style(vocabulary.into(), ChoiceStyle::Select)
    }

    /// Creates a radio field over a vocabulary.
    pub fn radio(vocabulary: impl Into<VocabularySource>) -> Self {
        Self::with_style(vocabulary.into(), ChoiceStyle::Radio)
    }

    /// Creates a yes/no field storing booleans.
    pub fn boolean() -> Self {
        Self::with_style(Vocabulary::boolean().into(), ChoiceStyle::Bool)
    }

    /// Creates a select field whose vocabulary is built per request.
    pub fn factory(factory: impl Fn(Option<&Context>) -> Vocabulary + Send + Sync + 'static) -> Self {
        Self::with_style(VocabularySource::Factory(Arc::new(factory)), ChoiceStyle::Select)
    }

    /// Renders the factory-built vocabulary as radio buttons.
    #[must_use]
    pub fn as_radio(mut self) -> Self {
        self.style = ChoiceStyle::Radio;
        self
    }

    /// Sets the label of the prompt option.
    #[must_use]
    pub fn prompt(mut self, message: impl Into<String>) -> Self {
        self.prompt = message.into();
        self
    }
}

impl FieldType for ChoiceField {
    fn type_name(&self) -> &str {
        match self.style {
            ChoiceStyle::Select => "choice",
            ChoiceStyle::Radio => "radio",
            ChoiceStyle::Bool => "bool",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn css_class(&self) -> Option<&str> {
        match self.style {
            ChoiceStyle::Select => Some("select-widget"),
            ChoiceStyle::Radio | ChoiceStyle::Bool => Some("radio-widget"),
        }
    }

    fn widget(&self) -> Widget {
        match self.style {
            ChoiceStyle::Select => Widget::Select {
                multiple: false,
                size: 1,
            },
            ChoiceStyle::Radio | ChoiceStyle::Bool => Widget::Radio,
        }
    }

    fn bind(&self, field: &mut BoundField, _request: &Request) -> Result<()> {
        field.vocabulary = Some(self.source.resolve(field.context.as_ref()));
        Ok(())
    }

    fn extract(&self, field: &BoundField) -> Value {
        match field.params.get_str(&field.name) {
            None | Some("") | Some(NO_VALUE_TOKEN) => Value::Null,
            Some(token) => Value::from(token),
        }
    }

    fn to_form(&self, field: &BoundField, value: &Value) -> std::result::Result<Value, Invalid> {
        value_to_token(field, value).map(Value::Text)
    }

    fn to_field(&self, field: &BoundField, value: &Value) -> std::result::Result<Value, Invalid> {
        if value.is_blank() {
            return Ok(Value::Null);
        }
        token_to_value(field, value)
    }

    fn update(&self, field: &mut BoundField) {
        field.update_base();

        let selected = field.form_value.as_ref().and_then(Value::as_str).map(str::to_string);
        let mut items = build_items(field, |token| selected.as_deref() == Some(token));

        if self.style == ChoiceStyle::Select && !field.required {
            items.insert(
                0,
                ChoiceItem {
                    id: format!("{}-novalue", field.id),
                    name: field.name.clone(),
                    value: NO_VALUE_TOKEN.to_string(),
                    label: self.prompt.clone(),
                    description: None,
                    checked: field.form_value.is_none(),
                },
            );
        }
        field.items = items;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MultiStyle {
    Checkboxes,
    Select { size: usize },
}

/// Multiple choice over a vocabulary, stored as a list of term values.
///
/// Renders as checkboxes (type tag `multichoice`) or a multi-select
/// (`multiselect`). Every submitted token is read; the whole list is
/// rejected when any token is unknown.
#[derive(Debug, Clone)]
pub struct MultiChoiceField {
    source: VocabularySource,
    style: MultiStyle,
}

impl MultiChoiceField {
    /// Creates a checkbox group over a vocabulary.
    pub fn new(vocabulary: impl Into<VocabularySource>) -> Self {
        Self {
            source: vocabulary.into(),
            style: MultiStyle::Checkboxes,
        }
    }

    /// Creates a multi-select over a vocabulary with 5 visible rows.
    pub fn select(vocabulary: impl Into<VocabularySource>) -> Self {
        Self {
            source: vocabulary.into(),
            style: MultiStyle::Select { size: 5 },
        }
    }

    /// Creates a checkbox group whose vocabulary is built per request.
    pub fn factory(factory: impl Fn(Option<&Context>) -> Vocabulary + Send + Sync + 'static) -> Self {
        Self::new(VocabularySource::Factory(Arc::new(factory)))
    }

    /// Sets the visible rows of a multi-select.
    #[must_use]
    pub fn size(mut self, size: usize) -> Self {
        self.style = MultiStyle::Select { size };
        self
    }
}

impl FieldType for MultiChoiceField {
    fn type_name(&self) -> &str {
        match self.style {
            MultiStyle::Checkboxes => "multichoice",
            MultiStyle::Select { .. } => "multiselect",
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn css_class(&self) -> Option<&str> {
        match self.style {
            MultiStyle::Checkboxes => Some("multichoice-widget"),
            MultiStyle::Select { .. } => Some("select-widget"),
        }
    }

    fn widget(&self) -> Widget {
        match self.style {
            MultiStyle::Checkboxes => Widget::Checkboxes,
            MultiStyle::Select { size } => Widget::Select {
                multiple: true,
                size,
            },
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::List(_))
    }

    fn bind(&self, field: &mut BoundField, _request: &Request) -> Result<()> {
        field.vocabulary = Some(self.source.resolve(field.context.as_ref()));
        Ok(())
    }

    fn extract(&self, field: &BoundField) -> Value {
        if !field.params.contains(&field.name) {
            return Value::Null;
        }
        Value::List(
            field
                .params
                .get_all(&field.name)
                .into_iter()
                .filter_map(Param::as_str)
                .filter(|token| *token != NO_VALUE_TOKEN)
                .map(Value::from)
                .collect(),
        )
    }

    fn to_form(&self, field: &BoundField, value: &Value) -> std::result::Result<Value, Invalid> {
        match value {
            Value::List(items) => items
                .iter()
                .map(|item| value_to_token(field, item).map(Value::Text))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::List),
            other => Err(not_in_vocabulary(field, other)),
        }
    }

    fn to_field(&self, field: &BoundField, value: &Value) -> std::result::Result<Value, Invalid> {
        if value.is_blank() {
            return Ok(Value::Null);
        }
        let tokens = match value {
            Value::List(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        tokens
            .iter()
            .map(|token| token_to_value(field, token))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn update(&self, field: &mut BoundField) {
        field.update_base();

        if field.form_value.is_none() {
            field.form_value = Some(Value::List(Vec::new()));
        }
        let selected: Vec<String> = field
            .form_value
            .as_ref()
            .and_then(Value::as_list)
            .unwrap_or_default()
            .iter()
            .map(ToString::to_string)
            .collect();
        field.items = build_items(field, |token| selected.iter().any(|s| s == token));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::params::Params;

    fn numbers() -> Vocabulary {
        Vocabulary::from_items([(1, "one", "One"), (2, "two", "Two"), (3, "three", "Three")])
            .unwrap()
    }

    fn bind(field: &Field, value: Value, params: Params) -> BoundField {
        field
            .bind(&Request::default(), "", value, &Arc::new(params), None)
            .unwrap()
    }

    #[test]
    fn test_choice_to_field() {
        let bound = bind(&Field::new("num", ChoiceField::new(numbers())), Value::Null, Params::new());

        assert_eq!(bound.to_field(&"two".into()).unwrap(), Value::Int(2));
        assert_eq!(bound.to_field(&"".into()).unwrap(), Value::Null);

        let err = bound.to_field(&"unknown-token".into()).unwrap_err();
        assert_eq!(err.to_string(), "\"unknown-token\" is not in vocabulary");
        assert_eq!(
            err.mapping.get("val").map(String::as_str),
            Some("unknown-token")
        );
    }

    #[test]
    fn test_choice_to_form() {
        let bound = bind(&Field::new("num", ChoiceField::new(numbers())), Value::Null, Params::new());

        assert_eq!(bound.to_form(&Value::Int(3)).unwrap(), Value::from("three"));
        let err = bound.to_form(&Value::Int(10)).unwrap_err();
        assert_eq!(err.to_string(), "\"10\" is not in vocabulary");
    }

    #[test]
    fn test_choice_extract_novalue() {
        let field = Field::new("num", ChoiceField::new(numbers()));

        let bound = bind(&field, Value::Null, Params::new().with("num", NO_VALUE_TOKEN));
        assert_eq!(bound.extract(), Value::Null);

        let bound = bind(&field, Value::Null, Params::new().with("num", ""));
        assert_eq!(bound.extract(), Value::Null);

        let bound = bind(&field, Value::Null, Params::new().with("num", "one"));
        assert_eq!(bound.extract(), Value::from("one"));
    }

    #[test]
    fn test_choice_items() {
        let field = Field::new("num", ChoiceField::new(numbers()));
        let mut bound = bind(&field, Value::Int(2), Params::new());
        bound.update();

        assert_eq!(bound.form_value, Some(Value::from("two")));
        assert_eq!(bound.items.len(), 3);
        assert_eq!(bound.items[0].id, "num-0");
        assert_eq!(bound.items[0].label, "One");
        assert!(!bound.items[0].checked);
        assert!(bound.items[1].checked);
    }

    #[test]
    fn test_optional_select_prompt() {
        let field = Field::new("num", ChoiceField::new(numbers())).required(false);
        let mut bound = bind(&field, Value::Null, Params::new());
        bound.update();

        assert_eq!(bound.items.len(), 4);
        let prompt = &bound.items[0];
        assert_eq!(prompt.id, "num-novalue");
        assert_eq!(prompt.value, NO_VALUE_TOKEN);
        assert_eq!(prompt.label, "select a value ...");
        assert!(prompt.checked);

        let radio = Field::new("num", ChoiceField::radio(numbers())).required(false);
        let mut bound = bind(&radio, Value::Null, Params::new());
        bound.update();
        assert_eq!(bound.items.len(), 3);
    }

    #[test]
    fn test_bool_field() {
        let field = Field::new("agree", ChoiceField::boolean());
        let bound = bind(&field, Value::Null, Params::new());

        assert_eq!(bound.kind().type_name(), "bool");
        assert_eq!(bound.to_field(&"true".into()).unwrap(), Value::Bool(true));
        assert_eq!(bound.to_form(&Value::Bool(false)).unwrap(), Value::from("false"));
    }

    #[test]
    fn test_vocabulary_factory() {
        let field = Field::new(
            "color",
            ChoiceField::factory(|context| {
                let extra = context
                    .and_then(|c| c.downcast_ref::<String>())
                    .cloned()
                    .unwrap_or_default();
                Vocabulary::from_values(["red".to_string(), extra]).unwrap()
            }),
        );
        let context: Context = Arc::new("blue".to_string());
        let bound = field
            .bind(
                &Request::default(),
                "",
                Value::Null,
                &Arc::new(Params::new()),
                Some(&context),
            )
            .unwrap();

        assert_eq!(bound.to_field(&"blue".into()).unwrap(), Value::from("blue"));
        assert!(bound.to_field(&"green".into()).is_err());
    }

    #[test]
    fn test_multichoice_extract() {
        let field = Field::new("nums", MultiChoiceField::new(numbers()));

        let bound = bind(&field, Value::Null, Params::new());
        assert_eq!(bound.extract(), Value::Null);

        let bound = bind(
            &field,
            Value::Null,
            Params::new()
                .with("nums", "one")
                .with("nums", NO_VALUE_TOKEN)
                .with("nums", "three"),
        );
        assert_eq!(
            bound.extract(),
            Value::List(vec!["one".into(), "three".into()])
        );
    }

    #[test]
    fn test_multichoice_atomic_failure() {
        let field = Field::new("nums", MultiChoiceField::new(numbers()));
        let bound = bind(&field, Value::Null, Params::new());

        assert_eq!(
            bound
                .to_field(&Value::List(vec!["one".into(), "two".into()]))
                .unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );

        let err = bound
            .to_field(&Value::List(vec!["one".into(), "bogus".into(), "two".into()]))
            .unwrap_err();
        assert_eq!(err.to_string(), "\"bogus\" is not in vocabulary");
    }

    #[test]
    fn test_multichoice_update() {
        let field = Field::new("nums", MultiChoiceField::select(numbers()));
        let mut bound = bind(&field, Value::Null, Params::new());
        bound.update();
        assert_eq!(bound.form_value, Some(Value::List(vec![])));
        assert!(bound.items.iter().all(|item| !item.checked));

        let mut bound = bind(
            &field,
            Value::List(vec![Value::Int(1), Value::Int(3)]),
            Params::new(),
        );
        bound.update();
        let checked: Vec<_> = bound
            .items
            .iter()
            .filter(|item| item.checked)
            .map(|item| item.value.as_str())
            .collect();
        assert_eq!(checked, vec!["one", "three"]);
        assert_eq!(
            bound.kind().widget(),
            Widget::Select {
                multiple: true,
                size: 5
            }
        );
    }
}
