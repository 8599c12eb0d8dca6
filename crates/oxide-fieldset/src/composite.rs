//! Composite fields: a named slot whose value is a mapping of sub-fields.
//!
//! Children are bound under the composite's resolved name, so a child
//! `city` of a composite bound as `address` reads the `address.city`
//! parameter. Conversion and validation visit every child before failing
//! and report all failures at once, as one aggregate [`Invalid`] filed
//! under the composite with one sub-error per failing child. Each sub-error
//! keeps the resolved name of the child that raised it.

use std::any::Any;

use crate::error::{FormError, Invalid, Result};
use crate::field::{BoundField, Field, FieldType, Mode, Widget};
use crate::fieldset::{Fieldset, Node};
use crate::request::Request;
use crate::value::{Data, Value};

/// Applies `op` to every included child of a bound composite, collecting
/// all failures into one aggregate error.
pub(crate) fn for_each_child(
    field: &BoundField,
    value: &Value,
    include: impl Fn(&str) -> bool,
    op: impl Fn(&BoundField, &Value) -> std::result::Result<Value, Invalid>,
) -> std::result::Result<Data, Invalid> {
    let empty = Data::new();
    let values = value.as_map().unwrap_or(&empty);

    let mut result = Data::new();
    let mut errors = Vec::new();
    for child in field.fields.iter().flat_map(|fields| fields.fields()) {
        if !include(&child.local_name) {
            continue;
        }
        let raw = values.get(&child.local_name).cloned().unwrap_or_default();
        match op(child, &raw) {
            Ok(converted) => {
                result.insert(child.local_name.clone(), converted);
            }
            Err(err) => {
                let mut err = err.tagged(&child.name, &child.local_name);
                err.name = Some(child.local_name.clone());
                errors.push(err);
            }
        }
    }

    if errors.is_empty() {
        Ok(result)
    } else {
        Err(Invalid::default()
            .with_field(&field.name)
            .with_name(&field.local_name)
            .with_errors(errors))
    }
}

/// Converts a raw child value, falling back to the child's missing value.
pub(crate) fn child_to_field(
    child: &BoundField,
    raw: &Value,
) -> std::result::Result<Value, Invalid> {
    let value = child.to_field(raw)?;
    Ok(if value.is_null() {
        child.missing.clone()
    } else {
        value
    })
}

pub(crate) fn child_validate(
    child: &BoundField,
    value: &Value,
) -> std::result::Result<Value, Invalid> {
    child.validate(value).map(|()| value.clone())
}

pub(crate) fn child_to_form(
    child: &BoundField,
    value: &Value,
) -> std::result::Result<Value, Invalid> {
    if value.is_absent() {
        Ok(Value::Null)
    } else {
        child.to_form(value)
    }
}

/// Reads every child's raw value, falling back to its missing value.
pub(crate) fn extract_children(field: &BoundField) -> Value {
    Value::Map(
        field
            .fields
            .iter()
            .flat_map(|fields| fields.fields())
            .map(|child| {
                let value = child.extract();
                let value = if value.is_null() {
                    child.missing.clone()
                } else {
                    value
                };
                (child.local_name.clone(), value)
            })
            .collect(),
    )
}

/// Checks that a composite's children are all fields.
pub(crate) fn check_children(owner: &str, fields: &Fieldset) -> Result<()> {
    match fields.nodes().find(|node| matches!(node, Node::Fieldset(_))) {
        Some(node) => Err(FormError::NestedFieldset(
            owner.to_string(),
            node.name().to_string(),
        )),
        None => Ok(()),
    }
}

/// Binds the template children under the field's resolved name.
pub(crate) fn bind_children(
    fields: &Fieldset,
    field: &mut BoundField,
    request: &Request,
) -> Result<()> {
    if field.value.is_absent() {
        field.value = Value::Map(Data::new());
    }
    let prefix = format!("{}.", field.name);
    let bound = fields.bind_prefixed(
        request,
        &prefix,
        field.value.as_map(),
        &field.params,
        field.context.as_ref(),
        None,
    )?;
    field.fields = Some(bound);
    Ok(())
}

/// Updates the composite and then every child, passing display mode down.
pub(crate) fn update_children(field: &mut BoundField) {
    field.update_base();

    let display = field.mode == Some(Mode::Display);
    if let Some(fields) = field.fields.as_mut() {
        if display {
            fields.set_mode(Mode::Display);
        }
        fields.update();
    }
}

/// A field made of named sub-fields. Type tag `composite`.
#[derive(Debug, Clone)]
pub struct CompositeField {
    fields: Fieldset,
}

impl CompositeField {
    /// Creates a composite over a non-empty fieldset of plain fields.
    pub fn new(fields: Fieldset) -> Result<Self> {
        if fields.is_empty() {
            return Err(FormError::EmptyComposite(fields.name().to_string()));
        }
        check_children(fields.name(), &fields)?;
        Ok(Self { fields })
    }

    /// Creates a composite over a sequence of fields.
    pub fn from_fields(fields: impl IntoIterator<Item = Field>) -> Result<Self> {
        Self::new(Fieldset::from_fields(fields)?)
    }

    /// Returns the child templates.
    pub fn fields(&self) -> &Fieldset {
        &self.fields
    }
}

impl FieldType for CompositeField {
    fn type_name(&self) -> &str {
        "composite"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn attach(&mut self, name: &str) {
        self.fields.set_prefix(format!("{name}."));
    }

    fn css_class(&self) -> Option<&str> {
        Some("composite-widget")
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
        extract_children(field)
    }

    fn to_form(&self, field: &BoundField, value: &Value) -> std::result::Result<Value, Invalid> {
        for_each_child(field, value, |_| true, child_to_form).map(Value::Map)
    }

    fn to_field(&self, field: &BoundField, value: &Value) -> std::result::Result<Value, Invalid> {
        for_each_child(field, value, |_| true, child_to_field).map(Value::Map)
    }

    fn validate(&self, field: &BoundField, value: &Value) -> std::result::Result<(), Invalid> {
        for_each_child(field, value, |_| true, child_validate)?;
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
    use crate::error::ERROR_REQUIRED;
    use crate::fields::{IntegerField, TextField};
    use crate::params::Params;

    fn address() -> Field {
        Field::new(
            "address",
            CompositeField::from_fields([
                Field::new("city", TextField::new()),
                Field::new("zip", IntegerField::new()),
            ])
            .unwrap(),
        )
    }

    fn bind(field: &Field, value: Value, params: Params) -> BoundField {
        field
            .bind(&Request::default(), "", value, &Arc::new(params), None)
            .unwrap()
    }

    #[test]
    fn test_ctor() {
        let err = CompositeField::new(Fieldset::new()).unwrap_err();
        assert!(matches!(err, FormError::EmptyComposite(_)));

        let field = address();
        let composite = field.kind_as::<CompositeField>().unwrap();
        assert_eq!(composite.fields().prefix(), "address.");
    }

    #[test]
    fn test_ctor_rejects_nested_fieldset() {
        let geo = Fieldset::named("geo")
            .with(Field::new("lat", TextField::new()))
            .unwrap();
        let fields = Fieldset::from_fields([Field::new("city", TextField::new())])
            .unwrap()
            .with(geo)
            .unwrap();

        let err = CompositeField::new(fields).unwrap_err();
        assert!(matches!(err, FormError::NestedFieldset(_, name) if name == "geo"));
    }

    #[test]
    fn test_bind_null_value() {
        let bound = bind(&address(), Value::Null, Params::new());

        assert_eq!(bound.value, Value::Map(Data::new()));
        let children = bound.fields.as_ref().unwrap();
        let city = children.field("city").unwrap();
        assert_eq!(city.name, "address.city");
        assert_eq!(city.value, Value::Null);
    }

    #[test]
    fn test_bind_value() {
        let mut data = Data::new();
        data.insert("city".to_string(), Value::from("Kyiv"));
        let bound = bind(&address(), Value::Map(data), Params::new());

        let city = bound.fields.as_ref().unwrap().field("city").unwrap();
        assert_eq!(city.value, Value::from("Kyiv"));
    }

    #[test]
    fn test_extract() {
        let bound = bind(
            &address(),
            Value::Null,
            Params::new().with("address.city", "Kyiv"),
        );
        let value = bound.extract();
        assert_eq!(value.get("city"), Some(&Value::from("Kyiv")));
        assert_eq!(value.get("zip"), Some(&Value::Null));
    }

    #[test]
    fn test_to_field_aggregates() {
        let bound = bind(&address(), Value::Null, Params::new());

        let mut raw = Data::new();
        raw.insert("city".to_string(), Value::from("Kyiv"));
        raw.insert("zip".to_string(), Value::from("abc"));
        let err = bound.to_field(&Value::Map(raw)).unwrap_err();

        assert_eq!(err.field.as_deref(), Some("address"));
        assert_eq!(err.name.as_deref(), Some("address"));
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err["zip"].field.as_deref(), Some("address.zip"));
        assert_eq!(err["zip"].to_string(), "\"abc\" is not a number");
    }

    #[test]
    fn test_validate_aggregates_all_children() {
        let bound = bind(&address(), Value::Null, Params::new());

        let value = bound.to_field(&bound.extract()).unwrap();
        let err = bound.validate(&value).unwrap_err();

        assert_eq!(err.errors.len(), 2);
        assert_eq!(err["city"].msg, ERROR_REQUIRED);
        assert_eq!(err["city"].field.as_deref(), Some("address.city"));
        assert_eq!(err["zip"].field.as_deref(), Some("address.zip"));
        assert_eq!(err.to_string(), "city: Required; zip: Required");
    }

    #[test]
    fn test_own_validator_runs_after_children() {
        let field = address().validator(|_: &BoundField, value: &Value| {
            if value.get("city") == Some(&Value::from("Nowhere")) {
                Err(Invalid::new("Unknown city"))
            } else {
                Ok(())
            }
        });
        let bound = bind(&field, Value::Null, Params::new());

        let mut value = Data::new();
        value.insert("city".to_string(), Value::from("Nowhere"));
        value.insert("zip".to_string(), Value::Int(1000));
        let err = bound.validate(&Value::Map(value)).unwrap_err();
        assert_eq!(err.msg, "Unknown city");
        assert_eq!(err.field.as_deref(), Some("address"));
    }

    #[test]
    fn test_to_form() {
        let bound = bind(&address(), Value::Null, Params::new());
        let mut value = Data::new();
        value.insert("city".to_string(), Value::from("Kyiv"));
        value.insert("zip".to_string(), Value::Int(1000));

        let form = bound.to_form(&Value::Map(value)).unwrap();
        assert_eq!(form.get("zip"), Some(&Value::from("1000")));
    }

    #[test]
    fn test_set_id_prefix() {
        let mut bound = bind(&address(), Value::Null, Params::new());
        bound.set_id_prefix("prefix.");

        assert_eq!(bound.id, "prefix-address");
        let city = bound.fields.as_ref().unwrap().field("city").unwrap();
        assert_eq!(city.id, "prefix-address-city");
    }

    #[test]
    fn test_update_display_mode() {
        let mut bound = bind(&address().readonly(), Value::Null, Params::new());
        bound.update();

        assert_eq!(bound.mode, Some(Mode::Display));
        let city = bound.fields.as_ref().unwrap().field("city").unwrap();
        assert_eq!(city.mode, Some(Mode::Display));
    }
}
