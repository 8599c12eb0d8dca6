//! # oxide-fieldset
//!
//! Typed form fields, fieldsets and request binding with structured
//! validation errors.
//!
//! This crate provides:
//! - Field templates ([`Field`]) bound per request into [`BoundField`]s
//! - Built-in field kinds: text, numbers, dates, files, choices
//! - Composite and grouping fields nesting whole fieldsets
//! - [`Fieldset`] extraction returning typed data and every error at once
//! - Forms with buttons, actions, CSRF protection and Bootstrap 5 rendering
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use oxide_fieldset::fields::{IntegerField, TextField};
//! use oxide_fieldset::{Field, Fieldset, Request, Value};
//!
//! let fields = Fieldset::from_fields([
//!     Field::new("name", TextField::new()),
//!     Field::new("age", IntegerField::new()),
//! ])?;
//!
//! let request = Request::post("/submit").body("name=Ann&age=abc")?;
//! let params = Arc::new(request.post.clone());
//! let bound = fields.bind(&request, None, &params, None)?;
//!
//! let (data, errors) = bound.extract();
//! assert_eq!(data["name"], Value::from("Ann"));
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].to_string(), "\"abc\" is not a number");
//! # Ok::<(), oxide_fieldset::FormError>(())
//! ```
//!
//! ## Forms
//!
//! ```rust
//! use oxide_fieldset::fields::TextField;
//! use oxide_fieldset::{Button, Buttons, Field, Fieldset, Form, Outcome, Request};
//!
//! let fields = Fieldset::from_fields([Field::new("name", TextField::new())])?;
//! let buttons = Buttons::new()
//!     .with(Button::new("save").extract().action(|_, data| Ok(data.map(Outcome::Data))))?;
//!
//! let request = Request::post("/").body("name=Ann&form.buttons.save=Save")?;
//! let mut form = Form::new(request, fields).buttons(buttons);
//!
//! let outcome = form.update()?;
//! assert!(matches!(outcome, Some(Outcome::Data(_))));
//!
//! let html = form.render();
//! assert!(html.contains(r#"id="form-widgets-name""#));
//! # Ok::<(), oxide_fieldset::FormError>(())
//! ```

pub mod button;
mod composite;
mod error;
mod field;
pub mod fields;
mod fieldset;
mod form;
mod grouping;
mod params;
pub mod registry;
mod request;
pub mod validation;
mod value;
mod vocabulary;
pub mod widgets;

pub use button::{ActionType, Actions, BoundButton, Button, Buttons, Outcome};
pub use composite::CompositeField;
pub use error::{FormError, Invalid, Result, ERROR_REQUIRED, ERROR_WRONG_TYPE};
pub use field::{
    BoundField, ChoiceItem, Context, Field, FieldOptions, FieldType, Mode, Preparer, Widget,
};
pub use fieldset::{
    BoundFieldset, BoundNode, FieldFilter, Fieldset, FieldsetErrors, FieldsetValidator, Node,
};
pub use form::{FieldsetWidgets, Form, FormSettings, FormValidator, FormWidgets};
pub use grouping::GroupingField;
pub use params::{Param, Params};
pub use registry::{FieldFactory, FieldRegistry};
pub use request::{Method, Request};
pub use validation::Validator;
pub use value::{Data, Upload, Value};
pub use vocabulary::{LookupError, Term, Vocabulary};
