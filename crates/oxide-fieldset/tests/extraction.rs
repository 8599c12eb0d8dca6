//! Tests for fieldset extraction over nested trees.

mod common;
use common::*;

use oxide_fieldset::fields::{ChoiceField, IntegerField, MultiChoiceField, TextField};
use oxide_fieldset::{
    BoundFieldset, CompositeField, Data, Field, Fieldset, FormError, Invalid, LookupError, Node, Request, Value,
    ERROR_REQUIRED,
};

// =============================================================================
// Example scenarios
// =============================================================================

#[test]
fn test_missing_text_is_required() {
    let fieldset = Fieldset::from_fields([Field::new("name", TextField::new())]).unwrap();
    let (data, errors) = bind(&fieldset, &[]).extract();

    assert_eq!(data.get("name"), Some(&Value::from("")));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].msg, ERROR_REQUIRED);
    assert_eq!(errors[0].field.as_deref(), Some("name"));
}

#[test]
fn test_bad_integer_keeps_missing() {
    let fieldset = Fieldset::from_fields([Field::new("age", IntegerField::new())]).unwrap();
    let (data, errors) = bind(&fieldset, &[("age", "12x")]).extract();

    assert_eq!(data.get("age"), Some(&Value::Null));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("12x"));
    assert_eq!(errors[0].mapping.get("val").map(String::as_str), Some("12x"));
}

#[test]
fn test_composite_reports_each_child() {
    let fieldset = Fieldset::from_fields([address()]).unwrap();
    let (data, errors) = bind(&fieldset, &[]).extract();

    assert_eq!(errors.len(), 1);
    let aggregate = &errors[0];
    assert_eq!(aggregate.field.as_deref(), Some("address"));
    assert_eq!(aggregate["city"].field.as_deref(), Some("address.city"));
    assert_eq!(aggregate["zip"].field.as_deref(), Some("address.zip"));

    let leaves: Vec<_> = errors
        .leaves()
        .into_iter()
        .map(|err| err.field.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(leaves, vec!["address.city", "address.zip"]);

    let address = data.get("address").unwrap();
    assert_eq!(address.get("city"), Some(&Value::from("")));
}

#[test]
fn test_unknown_token() {
    let vocabulary = colors();
    assert!(matches!(
        vocabulary.get_term_by_token("unknown-token"),
        Err(LookupError::Token(token)) if token == "unknown-token"
    ));

    let fieldset = Fieldset::from_fields([Field::new("color", ChoiceField::new(vocabulary))]).unwrap();
    let bound = bind(&fieldset, &[]);
    let color = bound.field("color").unwrap();

    let err = color.to_field(&Value::from("unknown-token")).unwrap_err();
    assert_eq!(err.to_string(), "\"unknown-token\" is not in vocabulary");
}

// =============================================================================
// Traversal
// =============================================================================

fn counted() -> (Fieldset, Vec<CountingField>) {
    let kinds: Vec<CountingField> = (0..4).map(|_| CountingField::default()).collect();
    let contact = Fieldset::named("contact")
        .with(Field::new("email", kinds[2].clone()))
        .and_then(|fs| fs.with(Field::new("phone", kinds[3].clone())))
        .unwrap();
    let fieldset = Fieldset::from_nodes([
        Node::from(Field::new("first", kinds[0].clone())),
        Node::from(Field::new("age", IntegerField::new())),
        Node::from(Field::new("last", kinds[1].clone())),
        Node::from(contact),
    ])
    .unwrap();
    (fieldset, kinds)
}

#[test]
fn test_every_field_visited_once() {
    let (fieldset, kinds) = counted();
    let bound = bind(&fieldset, &[("age", "bad"), ("contact.email", "a@b.c")]);

    let (data, errors) = bound.extract();
    for kind in &kinds {
        assert_eq!(kind.reads(), 1);
    }

    // first, age, last, contact.phone
    assert_eq!(errors.len(), 4);
    let contact = data.get("contact").unwrap();
    assert_eq!(contact.get("email"), Some(&Value::from("a@b.c")));
}

#[test]
fn test_nested_errors_come_first() {
    let (fieldset, _) = counted();
    let (_, errors) = bind(&fieldset, &[("age", "1")]).extract();

    let names: Vec<_> = errors.iter().map(|e| e.field.clone().unwrap_or_default()).collect();
    assert_eq!(
        names,
        vec!["contact.email", "contact.phone", "first", "last"]
    );
}

#[test]
fn test_extract_is_idempotent() {
    let (fieldset, _) = counted();
    let bound = bind(&fieldset, &[("first", "Ann"), ("age", "x")]);

    let first = bound.extract();
    let second = bound.extract();
    assert_eq!(first, second);
}

#[test]
fn test_composite_null_prior_value() {
    let fieldset = Fieldset::from_fields([address()]).unwrap();
    let bound = fieldset
        .bind(
            &Request::default(),
            Some(&Data::from_iter([("address".to_string(), Value::Null)])),
            &params(&[("address.city", "Kyiv"), ("address.zip", "1000")]),
            None,
        )
        .unwrap();

    let (data, errors) = bound.extract();
    assert!(errors.is_empty());
    let address = data.get("address").unwrap();
    assert_eq!(address.get("city"), Some(&Value::from("Kyiv")));
    assert_eq!(address.get("zip"), Some(&Value::Int(1000)));
}

#[test]
fn test_required_yields_single_error() {
    let fieldset = Fieldset::from_fields([
        Field::new("count", IntegerField::new()),
        Field::new("note", TextField::new()).required(false),
    ])
    .unwrap();
    let (_, errors) = bind(&fieldset, &[]).extract();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].msg, ERROR_REQUIRED);
    assert_eq!(errors[0].field.as_deref(), Some("count"));
}

#[test]
fn test_required_missing_policy() {
    let fieldset = Fieldset::from_fields([
        Field::new("nickname", TextField::new())
            .required(false)
            .missing_value(Value::Required),
        Field::new("note", TextField::new()).required(false),
    ])
    .unwrap();
    let (data, errors) = bind(&fieldset, &[]).extract();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].msg, ERROR_REQUIRED);
    assert_eq!(errors[0].field.as_deref(), Some("nickname"));
    assert_eq!(data.get("nickname"), Some(&Value::Required));
    assert_eq!(data.get("note"), Some(&Value::from("")));

    let (data, errors) = bind(&fieldset, &[("nickname", "ann")]).extract();
    assert!(errors.is_empty());
    assert_eq!(data.get("nickname"), Some(&Value::from("ann")));
}

#[test]
fn test_composite_rejects_nested_fieldset() {
    let geo = Fieldset::named("geo")
        .with(Field::new("lat", TextField::new()))
        .unwrap();
    let fields = Fieldset::from_fields([Field::new("city", TextField::new())])
        .unwrap()
        .with(geo)
        .unwrap();

    assert!(matches!(
        CompositeField::new(fields),
        Err(FormError::NestedFieldset(_, name)) if name == "geo"
    ));
}

#[test]
fn test_multichoice_rejects_whole_list() {
    let fieldset =
        Fieldset::from_fields([Field::new("colors", MultiChoiceField::new(colors()))]).unwrap();
    let (data, errors) = bind(
        &fieldset,
        &[("colors", "red"), ("colors", "purple"), ("colors", "blue")],
    )
    .extract();

    assert_eq!(data.get("colors"), Some(&Value::Null));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "\"purple\" is not in vocabulary");
}

#[test]
fn test_multichoice_converts_every_token() {
    let fieldset =
        Fieldset::from_fields([Field::new("colors", MultiChoiceField::new(colors()))]).unwrap();
    let (data, errors) = bind(&fieldset, &[("colors", "red"), ("colors", "blue")]).extract();

    assert!(errors.is_empty());
    assert_eq!(
        data.get("colors"),
        Some(&Value::List(vec![Value::from("r"), Value::from("b")]))
    );
}

// =============================================================================
// Fieldset validators
// =============================================================================

fn passwords() -> Fieldset {
    Fieldset::from_fields([
        Field::new("password", TextField::new()),
        Field::new("confirm", TextField::new()),
    ])
    .unwrap()
    .validator(|_: &BoundFieldset, data: &Data| {
        if data.get("password") == data.get("confirm") {
            Ok(())
        } else {
            Err(Invalid::new("Passwords do not match"))
        }
    })
}

#[test]
fn test_fieldset_validator_runs_when_clean() {
    let (data, errors) = bind(&passwords(), &[("password", "a"), ("confirm", "b")]).extract();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].msg, "Passwords do not match");
    assert!(errors[0].field.is_none());
    assert_eq!(data.get("password"), Some(&Value::from("a")));
    assert_eq!(errors.msg().get(""), Some(&"Passwords do not match".to_string()));
}

#[test]
fn test_fieldset_validator_skipped_on_field_errors() {
    let (_, errors) = bind(&passwords(), &[("password", "a")]).extract();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field.as_deref(), Some("confirm"));
}

// =============================================================================
// Misc
// =============================================================================

#[test]
fn test_duplicate_names_rejected() {
    let err = Fieldset::from_fields([
        Field::new("name", TextField::new()),
        Field::new("name", TextField::new()),
    ])
    .unwrap_err();
    assert!(matches!(err, FormError::DuplicateName(name) if name == "name"));
}

#[test]
fn test_data_serializes_to_json() {
    let fieldset = Fieldset::from_fields([
        Field::new("name", TextField::new()),
        Field::new("age", IntegerField::new()),
        address(),
    ])
    .unwrap();
    let (data, errors) = bind(
        &fieldset,
        &[
            ("name", "Ann"),
            ("age", "42"),
            ("address.city", "Kyiv"),
            ("address.zip", "1000"),
        ],
    )
    .extract();
    assert!(errors.is_empty());

    let json = serde_json::to_value(&data).unwrap();
    assert_eq!(json["name"], "Ann");
    assert_eq!(json["age"], 42);
    assert_eq!(json["address"]["city"], "Kyiv");
    assert_eq!(json["address"]["zip"], 1000);
}
