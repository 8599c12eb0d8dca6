//! Field templates and per-request bound fields.
//!
//! A [`Field`] is declared once and never mutated afterwards. Binding it to
//! a request produces an independent [`BoundField`] that carries all of the
//! per-request state: the resolved name, the prior content value, the
//! submitted parameters, the render mode and the computed form value.
//! Because the two are distinct types, a bound field cannot be bound again.
//!
//! The behaviour that differs between field kinds (wire conversion,
//! extraction, widget shape) lives behind the [`FieldType`] trait; the
//! built-in kinds are in [`crate::fields`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::error;

use crate::error::{Invalid, Result, ERROR_REQUIRED, ERROR_WRONG_TYPE};
use crate::fieldset::BoundFieldset;
use crate::params::{Param, Params};
use crate::request::Request;
use crate::validation::Validator;
use crate::value::Value;
use crate::vocabulary::Vocabulary;

/// Opaque application context passed through binding, e.g. the object a
/// form edits. Vocabulary factories receive it.
pub type Context = Arc<dyn Any + Send + Sync>;

/// Transformation applied to a value after it has been converted and
/// validated, before it is stored in the extracted data.
pub type Preparer = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Render mode of a bound field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Editable input widget.
    Input,
    /// Read-only display; display fields are skipped by extraction.
    Display,
}

/// Shape of the widget a field kind renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    /// Single `<input>` of the given type.
    Input {
        /// HTML input type.
        html_type: &'static str,
    },
    /// Multi-line `<textarea>`.
    TextArea {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },
    /// `<select>` over the field's vocabulary items.
    Select {
        /// Whether several options may be selected.
        multiple: bool,
        /// Visible rows.
        size: usize,
    },
    /// Radio buttons over the field's vocabulary items.
    Radio,
    /// Checkboxes over the field's vocabulary items.
    Checkboxes,
    /// A group of nested field widgets.
    Composite,
}

/// Behaviour of one kind of field.
///
/// Every method has a default implementing a plain text slot, so a kind
/// only overrides what differs. Methods receive the bound field they act
/// for; they never see the template.
pub trait FieldType: fmt::Debug + Send + Sync {
    /// Registry tag of this kind.
    fn type_name(&self) -> &str;

    /// Returns `self` for downcasting to the concrete kind.
    fn as_any(&self) -> &dyn Any;

    /// Called once when a field template is declared with this kind.
    fn attach(&mut self, _name: &str) {}

    /// Replaces this kind at bind time. Only factory kinds resolve to
    /// something else.
    fn resolve(&self, _request: &Request) -> Result<Option<Arc<dyn FieldType>>> {
        Ok(None)
    }

    /// Missing value used when the field template doesn't declare one.
    fn missing(&self) -> Value {
        Value::Null
    }

    /// Default css class of the widget.
    fn css_class(&self) -> Option<&str> {
        None
    }

    /// Widget shape used by renderers.
    fn widget(&self) -> Widget {
        Widget::Input { html_type: "text" }
    }

    /// Type constraint checked by validation for present values.
    fn accepts(&self, _value: &Value) -> bool {
        true
    }

    /// Finishes binding, e.g. binds nested fields or resolves a vocabulary.
    fn bind(&self, _field: &mut BoundField, _request: &Request) -> Result<()> {
        Ok(())
    }

    /// Reads the raw wire value from the submitted parameters.
    fn extract(&self, field: &BoundField) -> Value {
        field.extract_param()
    }

    /// Converts a typed value into its wire representation.
    fn to_form(&self, _field: &BoundField, value: &Value) -> std::result::Result<Value, Invalid> {
        Ok(value.clone())
    }

    /// Converts a wire value into the typed representation.
    fn to_field(&self, _field: &BoundField, value: &Value) -> std::result::Result<Value, Invalid> {
        Ok(value.clone())
    }

    /// Validates a typed value.
    fn validate(&self, field: &BoundField, value: &Value) -> std::result::Result<(), Invalid> {
        field.validate_base(value)
    }

    /// Prepares the field for rendering.
    fn update(&self, field: &mut BoundField) {
        field.update_base();
    }
}

/// Declared options shared by every field kind.
#[derive(Clone)]
pub struct FieldOptions {
    /// Title; defaults to the capitalized name.
    pub title: Option<String>,
    /// Description shown as help text.
    pub description: String,
    /// Value shown when there is neither a submission nor a content value.
    pub default: Value,
    /// Value stored when nothing usable was submitted; defaults to the
    /// kind's missing value.
    pub missing: Option<Value>,
    /// Whether a value equal to `missing` is an error. Defaults to true.
    pub required: bool,
    /// Whether the field renders in display mode.
    pub readonly: bool,
    /// Fixed render mode.
    pub mode: Option<Mode>,
    /// Validator run after the built-in checks.
    pub validator: Option<Arc<dyn Validator>>,
    /// Transformation applied to valid values.
    pub preparer: Option<Preparer>,
    /// Custom conversion error message.
    pub error_msg: Option<String>,
    /// Css class overriding the kind's default.
    pub css_class: Option<String>,
}

impl FieldOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self {
            title: None,
            description: String::new(),
            default: Value::Null,
            missing: None,
            required: true,
            readonly: false,
            mode: None,
            validator: None,
            preparer: None,
            error_msg: None,
            css_class: None,
        }
    }
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FieldOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOptions")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("default", &self.default)
            .field("missing", &self.missing)
            .field("required", &self.required)
            .field("readonly", &self.readonly)
            .field("mode", &self.mode)
            .field("error_msg", &self.error_msg)
            .finish_non_exhaustive()
    }
}

/// A field template.
#[derive(Clone)]
pub struct Field {
    name: String,
    options: FieldOptions,
    kind: Arc<dyn FieldType>,
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind.type_name())
            .field("options", &self.options)
            .finish()
    }
}

impl Field {
    /// Declares a field of the given kind.
    pub fn new(name: impl Into<String>, mut kind: impl FieldType + 'static) -> Self {
        let name = name.into();
        kind.attach(&name);
        Self {
            name,
            options: FieldOptions::new(),
            kind: Arc::new(kind),
        }
    }

    /// Declares a field with a shared kind.
    pub fn with_kind(name: impl Into<String>, kind: Arc<dyn FieldType>) -> Self {
        Self {
            name: name.into(),
            options: FieldOptions::new(),
            kind,
        }
    }

    /// Returns the unprefixed name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the title.
    pub fn title(&self) -> String {
        self.options
            .title
            .clone()
            .unwrap_or_else(|| capitalize(&self.name))
    }

    /// Returns the declared options.
    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// Returns the kind.
    pub fn kind(&self) -> &Arc<dyn FieldType> {
        &self.kind
    }

    /// Returns the kind as a concrete type.
    pub fn kind_as<T: 'static>(&self) -> Option<&T> {
        self.kind.as_any().downcast_ref::<T>()
    }

    /// Returns the missing value, resolving the kind default.
    pub fn missing(&self) -> Value {
        self.options
            .missing
            .clone()
            .unwrap_or_else(|| self.kind.missing())
    }

    /// Replaces all options.
    #[must_use]
    pub fn options_from(mut self, options: FieldOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.options.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.options.description = text.into();
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.options.default = value.into();
        self
    }

    /// Sets the missing value.
    #[must_use]
    pub fn missing_value(mut self, value: impl Into<Value>) -> Self {
        self.options.missing = Some(value.into());
        self
    }

    /// Sets whether the field is required.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.options.required = required;
        self
    }

    /// Makes the field read-only.
    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.options.readonly = true;
        self
    }

    /// Fixes the render mode.
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.options.mode = Some(mode);
        self
    }

    /// Sets the validator.
    #[must_use]
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.options.validator = Some(Arc::new(validator));
        self
    }

    /// Sets the preparer.
    #[must_use]
    pub fn preparer(mut self, preparer: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.options.preparer = Some(Arc::new(preparer));
        self
    }

    /// Sets a custom conversion error message.
    #[must_use]
    pub fn error_msg(mut self, msg: impl Into<String>) -> Self {
        self.options.error_msg = Some(msg.into());
        self
    }

    /// Sets the widget css class.
    #[must_use]
    pub fn css_class(mut self, class: impl Into<String>) -> Self {
        self.options.css_class = Some(class.into());
        self
    }

    /// Binds the template to a request, producing an independent clone.
    ///
    /// The bound name is `prefix` followed by the field name; the widget id
    /// is the bound name with `.` replaced by `-`. `value` is the prior
    /// content value for this field, [`Value::Null`] when there is none.
    pub fn bind(
        &self,
        request: &Request,
        prefix: &str,
        value: Value,
        params: &Arc<Params>,
        context: Option<&Context>,
    ) -> Result<BoundField> {
        let kind = self
            .kind
            .resolve(request)?
            .unwrap_or_else(|| Arc::clone(&self.kind));

        let name = format!("{prefix}{}", self.name);
        let mut bound = BoundField {
            id: name.replace('.', "-"),
            name,
            local_name: self.name.clone(),
            title: self.title(),
            description: self.options.description.clone(),
            default: self.options.default.clone(),
            missing: self
                .options
                .missing
                .clone()
                .unwrap_or_else(|| kind.missing()),
            required: self.options.required,
            readonly: self.options.readonly,
            mode: self.options.mode,
            value,
            form_value: None,
            error: None,
            klass: self
                .options
                .css_class
                .clone()
                .or_else(|| kind.css_class().map(str::to_string)),
            error_msg: self.options.error_msg.clone(),
            params: Arc::clone(params),
            context: context.cloned(),
            fields: None,
            vocabulary: None,
            items: Vec::new(),
            validator: self.options.validator.clone(),
            preparer: self.options.preparer.clone(),
            kind: Arc::clone(&kind),
        };
        kind.bind(&mut bound, request)?;
        Ok(bound)
    }
}

/// One rendered option of a vocabulary field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceItem {
    /// Widget id.
    pub id: String,
    /// Parameter name.
    pub name: String,
    /// Submitted token.
    pub value: String,
    /// Display label.
    pub label: String,
    /// Term description.
    pub description: Option<String>,
    /// Whether the option is selected.
    pub checked: bool,
}

/// A field bound to one request.
#[derive(Clone)]
pub struct BoundField {
    /// Resolved name: bind prefix followed by the field name.
    pub name: String,
    /// Unprefixed name; the key used in extracted data.
    pub local_name: String,
    /// Widget id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Default value.
    pub default: Value,
    /// Missing value.
    pub missing: Value,
    /// Whether a value equal to `missing` is an error.
    pub required: bool,
    /// Whether the field renders in display mode.
    pub readonly: bool,
    /// Render mode, decided by [`BoundField::update`] when not fixed.
    pub mode: Option<Mode>,
    /// Prior content value.
    pub value: Value,
    /// Wire value to render, computed by [`BoundField::update`].
    pub form_value: Option<Value>,
    /// Error attached to this field.
    pub error: Option<Invalid>,
    /// Widget css class.
    pub klass: Option<String>,
    /// Custom conversion error message.
    pub error_msg: Option<String>,
    /// Submitted parameters.
    pub params: Arc<Params>,
    /// Application context.
    pub context: Option<Context>,
    /// Bound children of a composite field.
    pub fields: Option<BoundFieldset>,
    /// Resolved vocabulary of a choice field.
    pub vocabulary: Option<Arc<Vocabulary>>,
    /// Rendered options of a choice field.
    pub items: Vec<ChoiceItem>,
    validator: Option<Arc<dyn Validator>>,
    preparer: Option<Preparer>,
    kind: Arc<dyn FieldType>,
}

impl fmt::Debug for BoundField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundField")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("kind", &self.kind.type_name())
            .field("value", &self.value)
            .field("mode", &self.mode)
            .field("form_value", &self.form_value)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl BoundField {
    /// Returns the kind.
    pub fn kind(&self) -> &Arc<dyn FieldType> {
        &self.kind
    }

    /// Returns the kind as a concrete type.
    pub fn kind_as<T: 'static>(&self) -> Option<&T> {
        self.kind.as_any().downcast_ref::<T>()
    }

    /// Replaces the kind; used by factory kinds while binding.
    pub fn set_kind(&mut self, kind: Arc<dyn FieldType>) {
        self.kind = kind;
    }

    /// Returns the preparer.
    pub fn preparer(&self) -> Option<&Preparer> {
        self.preparer.as_ref()
    }

    /// Reads the raw wire value for this field.
    pub fn extract(&self) -> Value {
        self.kind.extract(self)
    }

    /// Converts a wire value into the typed representation.
    pub fn to_field(&self, value: &Value) -> std::result::Result<Value, Invalid> {
        self.kind.to_field(self, value)
    }

    /// Converts a typed value into its wire representation.
    pub fn to_form(&self, value: &Value) -> std::result::Result<Value, Invalid> {
        self.kind.to_form(self, value)
    }

    /// Validates a typed value.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), Invalid> {
        self.kind.validate(self, value)
    }

    /// Prepares the field for rendering.
    pub fn update(&mut self) {
        let kind = Arc::clone(&self.kind);
        kind.update(self);
    }

    /// Reads the last submitted parameter for the resolved name.
    pub fn extract_param(&self) -> Value {
        self.params
            .get(&self.name)
            .map_or(Value::Null, Param::to_value)
    }

    /// Checks the required flag, the kind's type constraint and the
    /// declared validator, in that order.
    pub fn validate_base(&self, value: &Value) -> std::result::Result<(), Invalid> {
        if value.is_required() || (self.required && *value == self.missing) {
            return Err(self.invalid(ERROR_REQUIRED));
        }

        if !value.is_absent() && !self.kind.accepts(value) {
            return Err(self.invalid(ERROR_WRONG_TYPE));
        }

        if let Some(validator) = &self.validator {
            validator
                .validate(self, value)
                .map_err(|err| err.tagged(&self.name, &self.local_name))?;
        }

        Ok(())
    }

    /// Decides the render mode and the form value.
    ///
    /// A submitted value takes precedence; otherwise the content value, or
    /// the default when there is none, is converted with `to_form`. A value
    /// that cannot be converted is logged and rendered as absent.
    pub fn update_base(&mut self) {
        if self.mode.is_none() {
            self.mode = Some(if self.readonly {
                Mode::Display
            } else {
                Mode::Input
            });
        }

        if self.readonly {
            self.add_css_class("disabled");
        }

        let widget_value = self.extract();
        if !widget_value.is_null() {
            self.form_value = Some(widget_value);
            return;
        }

        let value = if self.value.is_null() {
            self.default.clone()
        } else {
            self.value.clone()
        };

        let value = if value.is_null() {
            value
        } else {
            match self.to_form(&value) {
                Ok(converted) => converted,
                Err(err) => {
                    error!(field = %self.name, error = %err, "can't convert value for rendering");
                    Value::Null
                }
            }
        };

        self.form_value = if value.is_null() { None } else { Some(value) };
    }

    /// Builds an error originating from this field.
    pub fn invalid(&self, msg: impl Into<String>) -> Invalid {
        Invalid::new(msg)
            .with_field(&self.name)
            .with_name(&self.local_name)
    }

    /// Returns the custom error message or `default`.
    pub fn error_msg_or(&self, default: &str) -> String {
        self.error_msg
            .clone()
            .unwrap_or_else(|| default.to_string())
    }

    /// Appends a css class to the widget class.
    pub fn add_css_class(&mut self, css: &str) {
        let current = self.klass.take().unwrap_or_default();
        if current.split_whitespace().any(|c| c == css) {
            self.klass = Some(current);
            return;
        }
        self.klass = Some(format!("{current} {css}").trim().to_string());
    }

    /// Recomputes the widget id under `prefix`, including nested fields.
    pub fn set_id_prefix(&mut self, prefix: &str) {
        self.id = format!("{prefix}{}", self.name).replace('.', "-");
        if let Some(fields) = self.fields.as_mut() {
            fields.set_id_prefix(prefix);
        }
    }

    /// Returns the error attached to this field.
    pub fn error(&self) -> Option<&Invalid> {
        self.error.as_ref()
    }

    /// Returns the sub-error filed under `name` of the attached error.
    pub fn sub_error(&self, name: &str) -> Option<&Invalid> {
        self.error.as_ref().and_then(|err| err.get(name))
    }

    /// Returns the form value as display text.
    pub fn form_text(&self) -> String {
        self.form_value
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }
}

/// Uppercases the first character and lowercases the rest.
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
