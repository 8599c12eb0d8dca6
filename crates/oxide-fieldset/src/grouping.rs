//! Grouping fields: a composite where a radio key selects one group.

use std::any::Any;

use crate::composite::{
    bind_children, check_children, child_to_field, child_to_form, child_validate,
    extract_children, for_each_child, update_children,
};
use crate::error::{FormError, Invalid, Result};
use crate::field::{BoundField, Field, FieldType, Widget};
use crate::fields::ChoiceField;
use crate::fieldset::{Fieldset, Node};
use crate::request::Request;
use crate::value::{Data, Value};
use crate::vocabulary::{Term, Vocabulary};

/// A composite whose first child is a radio choosing between the other
/// children. Type tag `grouping`.
///
/// Only the selected group is converted and validated. Unless
/// [`GroupingField::extract_all`] is set, extraction yields just the key and
/// the selected group's data.
#[derive(Debug, Clone)]
pub struct GroupingField {
    key: String,
    fields: Fieldset,
    extract_all: bool,
}

impl GroupingField {
    /// Creates a grouping over `groups`, keyed by a radio named `key`.
    ///
    /// The first group is the default selection.
    pub fn new(key: impl Into<String>, groups: Fieldset) -> Result<Self> {
        let key = key.into();
        check_children(&key, &groups)?;
        let terms: Vec<Term> = groups
            .fields()
            .map(|field| Term::new(field.name(), field.name(), field.title()))
            .collect();
        let first = terms
            .first()
            .map(|term| term.value.clone())
            .ok_or_else(|| FormError::EmptyComposite(key.clone()))?;

        let selector = Field::new(&key, ChoiceField::radio(Vocabulary::new(terms)?))
            .required(false)
            .missing_value(first.clone())
            .default(first);

        let mut fields =
            Fieldset::from_nodes(std::iter::once(Node::from(selector)).chain(groups.nodes().cloned()))?;
        fields.set_prefix(groups.prefix().to_string());

        Ok(Self {
            key,
            fields,
            extract_all: false,
        })
    }

    /// Extracts every group instead of only the selected one.
    #[must_use]
    pub fn extract_all(mut self) -> Self {
        self.extract_all = true;
        self
    }

    /// Returns the name of the key field.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the child templates, key field first.
    pub fn fields(&self) -> &Fieldset {
        &self.fields
    }

    fn selected<'a>(&self, value: &'a Value) -> Option<&'a str> {
        value.get(&self.key).and_then(Value::as_str)
    }

    fn includes(&self, value: &Value, name: &str) -> bool {
        name == self.key || self.selected(value) == Some(name)
    }
}

impl FieldType for GroupingField {
    fn type_name(&self) -> &str {
        "grouping"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn attach(&mut self, name: &str) {
        self.fields.set_prefix(format!("{name}."));
    }

    fn css_class(&self) -> Option<&str> {
        Some("grouping-widget")
    }

    fn widget(&self) -> Widget {
        Widget::Composite
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Map(_))
    }

    fn bind(&self, field: &mut BoundField, request: &Request) -> Result<()> {
        bind_children(&self.fields, field, request)
    }

    fn extract(&self, field: &BoundField) -> Value {
        let value = extract_children(field);
        if self.extract_all {
            return value;
        }

        let mut result = Data::new();
        match self.selected(&value) {
            Some(group) if value.get(group).is_some() => {
                result.insert(self.key.clone(), Value::from(group));
                result.insert(
                    group.to_string(),
                    value.get(group).cloned().unwrap_or_default(),
                );
            }
            _ => {
                let key = value.get(&self.key).cloned().unwrap_or_default();
                result.insert(self.key.clone(), key);
            }
        }
        Value::Map(result)
    }

    fn to_form(&self, field: &BoundField, value: &Value) -> std::result::Result<Value, Invalid> {
        for_each_child(field, value, |_| true, child_to_form).map(Value::Map)
    }

    fn to_field(&self, field: &BoundField, value: &Value) -> std::result::Result<Value, Invalid> {
        for_each_child(field, value, |name| self.includes(value, name), child_to_field)
            .map(Value::Map)
    }

    fn validate(&self, field: &BoundField, value: &Value) -> std::result::Result<(), Invalid> {
        for_each_child(field, value, |name| self.includes(value, name), child_validate)?;
        field.validate_base(value)
    }

    fn update(&self, field: &mut BoundField) {
        update_children(field);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::composite::CompositeField;
    use crate::fields::TextField;
    use crate::params::Params;

    fn contact() -> Field {
        let groups = Fieldset::from_fields([
            Field::new(
                "email",
                CompositeField::from_fields([Field::new("address", TextField::new())]).unwrap(),
            ),
            Field::new(
                "phone",
                CompositeField::from_fields([Field::new("number", TextField::new())]).unwrap(),
            ),
        ])
        .unwrap();
        Field::new("contact", GroupingField::new("kind", groups).unwrap())
    }

    fn bind(field: &Field, params: Params) -> BoundField {
        field
            .bind(&Request::default(), "", Value::Null, &Arc::new(params), None)
            .unwrap()
    }

    #[test]
    fn test_key_field_first() {
        let field = contact();
        let grouping = field.kind_as::<GroupingField>().unwrap();
        let names: Vec<_> = grouping.fields().names().collect();
        assert_eq!(names, vec!["kind", "email", "phone"]);
        assert_eq!(grouping.fields().prefix(), "contact.");
    }

    #[test]
    fn test_extract_selected_group() {
        let bound = bind(
            &contact(),
            Params::new()
                .with("contact.kind", "phone")
                .with("contact.phone.number", "555")
                .with("contact.email.address", "ignored@example.com"),
        );
        let value = bound.extract();
        let map = value.as_map().unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("kind"), Some(&Value::from("phone")));
        assert_eq!(
            value.get("phone").and_then(|v| v.get("number")),
            Some(&Value::from("555"))
        );
    }

    #[test]
    fn test_validate_only_selected_group() {
        let bound = bind(
            &contact(),
            Params::new()
                .with("contact.kind", "phone")
                .with("contact.phone.number", "555"),
        );
        let value = bound.to_field(&bound.extract()).unwrap();
        assert!(bound.validate(&value).is_ok());

        let bound = bind(&contact(), Params::new().with("contact.kind", "phone"));
        let value = bound.to_field(&bound.extract()).unwrap();
        let err = bound.validate(&value).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(
            err["phone"]["number"].field.as_deref(),
            Some("contact.phone.number")
        );
    }

    #[test]
    fn test_unknown_key_is_reported() {
        let bound = bind(
            &contact(),
            Params::new()
                .with("contact.kind", "fax")
                .with("contact.phone.number", "555"),
        );
        let value = bound.extract();
        assert_eq!(value.get("kind"), Some(&Value::from("fax")));

        let err = bound.to_field(&value).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err["kind"].field.as_deref(), Some("contact.kind"));
        assert_eq!(err["kind"].to_string(), "\"fax\" is not in vocabulary");
    }

    #[test]
    fn test_nested_fieldset_rejected() {
        let groups = Fieldset::new()
            .with(Fieldset::named("fax").with(Field::new("number", TextField::new())).unwrap())
            .unwrap();
        let err = GroupingField::new("kind", groups).unwrap_err();
        assert!(matches!(err, FormError::NestedFieldset(owner, name) if owner == "kind" && name == "fax"));
    }

    #[test]
    fn test_default_selection() {
        let bound = bind(&contact(), Params::new());
        let value = bound.extract();
        assert_eq!(value.get("kind"), Some(&Value::from("email")));
    }
}
