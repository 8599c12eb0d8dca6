//! Forms: a fieldset bound to a request, with buttons and CSRF protection.
//!
//! [`Form::update`] binds the widgets and the buttons and runs the handler
//! of every submitted button. [`Form::extract`] returns the typed data and
//! the errors, after running the form-level validation and attaching each
//! error to its widget.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::button::{Actions, Buttons, Outcome};
use crate::error::{FormError, Invalid, Result};
use crate::field::{BoundField, Context, Mode};
use crate::fieldset::{BoundFieldset, Fieldset, FieldsetErrors};
use crate::params::Params;
use crate::request::{Method, Request};
use crate::value::Data;
use crate::widgets::{BootstrapRenderer, Renderer};

/// Form-level settings, loadable from application config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// Prefix of widget ids and button names.
    pub prefix: String,
    /// Method the form is submitted with.
    pub method: Method,
    /// Whether the CSRF token is checked on extraction.
    pub csrf: bool,
    /// Parameter carrying the CSRF token.
    pub csrf_name: String,
    /// Encoding type of the form element.
    pub enctype: String,
    /// Css class of the form element.
    pub css_class: String,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            prefix: "form.".to_string(),
            method: Method::Post,
            csrf: false,
            csrf_name: "csrf-token".to_string(),
            enctype: "multipart/form-data".to_string(),
            css_class: "form-horizontal".to_string(),
        }
    }
}

/// Additional validation run by [`Form::extract`] after the fieldset.
pub trait FormValidator: Send + Sync {
    /// Validates the extracted data.
    fn validate(&self, form: &Form, data: &Data) -> std::result::Result<(), Invalid>;
}

impl<F> FormValidator for F
where
    F: Fn(&Form, &Data) -> std::result::Result<(), Invalid> + Send + Sync,
{
    fn validate(&self, form: &Form, data: &Data) -> std::result::Result<(), Invalid> {
        self(form, data)
    }
}

/// The widgets of a form: its fieldset bound to the form content and
/// parameters, with render modes, ids and form values computed.
#[derive(Debug, Clone)]
pub struct FormWidgets {
    /// Render mode applied to widgets without a fixed mode.
    pub mode: Mode,
    /// Prefix of widget ids.
    pub prefix: String,
    fieldset: BoundFieldset,
    listings: Vec<FieldsetWidgets>,
}

/// The widgets of one fieldset, by resolved name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldsetWidgets {
    /// Fieldset name.
    pub name: String,
    /// Fieldset title.
    pub title: String,
    /// Resolved names of the fieldset's own widgets.
    pub widgets: Vec<String>,
}

impl FormWidgets {
    /// Prefix of widget ids, appended to the form prefix.
    pub const PREFIX: &'static str = "widgets.";

    /// Binds and updates the widgets of `form`.
    pub fn bind(form: &Form) -> Result<Self> {
        let prefix = format!("{}{}", form.settings.prefix, Self::PREFIX);
        let params = Arc::new(form.form_params().clone());

        let mut fieldset = form.fields.bind(
            &form.request,
            form.content.as_ref(),
            &params,
            form.context.as_ref(),
        )?;
        if form.mode == Mode::Display {
            fieldset.set_mode(Mode::Display);
        }
        fieldset.set_id_prefix(&prefix);
        fieldset.update();

        let listings = fieldset
            .fieldsets()
            .into_iter()
            .map(|fs| FieldsetWidgets {
                name: fs.name.clone(),
                title: fs.title.clone(),
                widgets: fs.fields().map(|field| field.name.clone()).collect(),
            })
            .collect();

        Ok(Self {
            mode: form.mode,
            prefix,
            fieldset,
            listings,
        })
    }

    /// Returns the bound fieldset.
    pub fn fieldset(&self) -> &BoundFieldset {
        &self.fieldset
    }

    /// Returns the bound fieldset mutably.
    pub fn fieldset_mut(&mut self) -> &mut BoundFieldset {
        &mut self.fieldset
    }

    /// Returns a widget by resolved name, at any depth.
    pub fn get(&self, name: &str) -> Option<&BoundField> {
        self.fieldset.find_field(name)
    }

    /// Returns the widgets of the top-level fieldset.
    pub fn fields(&self) -> impl Iterator<Item = &BoundField> {
        self.fieldset.fields()
    }

    /// Returns the widgets grouped by fieldset, top level first.
    pub fn listings(&self) -> &[FieldsetWidgets] {
        &self.listings
    }
}

/// A form bound to one request.
pub struct Form {
    request: Request,
    fields: Fieldset,
    buttons: Buttons,
    settings: FormSettings,
    /// Heading of the form.
    pub label: Option<String>,
    /// Text shown under the heading.
    pub description: String,
    /// Target url; the request url when unset.
    pub action: Option<String>,
    /// Prior content values by field name.
    pub content: Option<Data>,
    /// Render mode of the widgets.
    pub mode: Mode,
    /// Parameters used instead of the request's.
    pub params: Option<Params>,
    /// Application context handed to fields.
    pub context: Option<Context>,
    validators: Vec<Arc<dyn FormValidator>>,
    widgets: Option<FormWidgets>,
    actions: Actions,
    messages: Vec<String>,
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("settings", &self.settings)
            .field("fields", &self.fields)
            .field("buttons", &self.buttons)
            .field("mode", &self.mode)
            .field("messages", &self.messages)
            .finish_non_exhaustive()
    }
}

impl Form {
    /// Creates an input form over `fields`.
    pub fn new(request: Request, fields: Fieldset) -> Self {
        Self {
            request,
            fields,
            buttons: Buttons::new(),
            settings: FormSettings::default(),
            label: None,
            description: String::new(),
            action: None,
            content: None,
            mode: Mode::Input,
            params: None,
            context: None,
            validators: Vec::new(),
            widgets: None,
            actions: Actions::default(),
            messages: Vec::new(),
        }
    }

    /// Creates a form that only displays its content. Submitted parameters
    /// are ignored.
    pub fn display(request: Request, fields: Fieldset) -> Self {
        Self {
            mode: Mode::Display,
            params: Some(Params::new()),
            ..Self::new(request, fields)
        }
    }

    /// Sets the settings.
    #[must_use]
    pub fn settings(mut self, settings: FormSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the buttons.
    #[must_use]
    pub fn buttons(mut self, buttons: Buttons) -> Self {
        self.buttons = buttons;
        self
    }

    /// Sets the prior content values.
    #[must_use]
    pub fn content(mut self, content: Data) -> Self {
        self.content = Some(content);
        self
    }

    /// Sets the render mode.
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Uses `params` instead of the request parameters.
    #[must_use]
    pub fn params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets the application context.
    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Sets the heading.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the target url.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Adds a form-level validator.
    #[must_use]
    pub fn validator(mut self, validator: impl FormValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Returns the request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the field templates.
    pub fn fields(&self) -> &Fieldset {
        &self.fields
    }

    /// Returns the button templates.
    pub fn get_buttons(&self) -> &Buttons {
        &self.buttons
    }

    /// Returns the settings.
    pub fn get_settings(&self) -> &FormSettings {
        &self.settings
    }

    /// Form name: the prefix without surrounding dots.
    pub fn name(&self) -> &str {
        self.settings.prefix.trim_matches('.')
    }

    /// Html id of the form element.
    pub fn id(&self) -> String {
        self.name().replace('.', "-")
    }

    /// Target url of the form element.
    pub fn action_url(&self) -> &str {
        self.action.as_deref().unwrap_or(&self.request.url)
    }

    /// CSRF token of the session.
    pub fn token(&self) -> Option<&str> {
        self.request.csrf_token.as_deref()
    }

    /// Parameters the form reads: the explicit params when set, otherwise
    /// the request params of the form method.
    pub fn form_params(&self) -> &Params {
        if let Some(params) = &self.params {
            return params;
        }
        match self.settings.method {
            Method::Post => &self.request.post,
            Method::Get => &self.request.get,
        }
    }

    /// Returns the widgets bound by the last update.
    pub fn widgets(&self) -> Option<&FormWidgets> {
        self.widgets.as_ref()
    }

    /// Returns the buttons bound by the last update.
    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    /// Returns the form-level error messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Adds a form-level error message.
    pub fn add_error_message(&mut self, msg: impl Into<String>) {
        self.messages.push(msg.into());
    }

    /// Adds the messages of errors not tied to a field.
    pub fn add_errors(&mut self, errors: &FieldsetErrors) {
        for error in errors.leaves() {
            if error.field.is_none() {
                self.messages.push(error.message());
            }
        }
    }

    /// Binds the widgets.
    pub fn update_widgets(&mut self) -> Result<()> {
        self.widgets = Some(FormWidgets::bind(self)?);
        Ok(())
    }

    /// Binds the buttons.
    pub fn update_actions(&mut self) {
        self.actions = Actions::bind(self);
    }

    /// Binds widgets and buttons and runs the handler of every submitted
    /// button. Returns the outcome of the last handler.
    pub fn update(&mut self) -> Result<Option<Outcome>> {
        self.update_widgets()?;
        self.update_actions();
        self.execute()
    }

    fn execute(&mut self) -> Result<Option<Outcome>> {
        let activated = self.actions.activated();
        let mut result = None;
        for button in &activated {
            debug!(form = %self.name(), button = %button.name(), "executing form action");
            result = button.call(self)?;
        }

        if !activated.is_empty() {
            self.update_actions();
        }
        Ok(result)
    }

    /// Checks the submitted CSRF token against the session token.
    pub fn validate_csrf_token(&self) -> Result<()> {
        if !self.settings.csrf {
            return Ok(());
        }

        let submitted = self.form_params().get_str(&self.settings.csrf_name);
        match (submitted, self.token()) {
            (Some(submitted), Some(token)) if submitted == token => Ok(()),
            _ => {
                warn!(form = %self.name(), "form authenticator is not found");
                Err(FormError::Forbidden)
            }
        }
    }

    /// Form-level validation: the CSRF check, then every form validator.
    pub fn validate(&self, data: &Data, errors: &mut FieldsetErrors) -> Result<()> {
        self.validate_csrf_token()?;
        for validator in &self.validators {
            if let Err(error) = validator.validate(self, data) {
                errors.push(error);
            }
        }
        Ok(())
    }

    /// Extracts the submitted data and attaches every error to its widget.
    ///
    /// Binds the widgets first when [`Form::update`] hasn't run.
    pub fn extract(&mut self) -> Result<(Data, FieldsetErrors)> {
        if self.widgets.is_none() {
            self.update_widgets()?;
        }
        let Some(widgets) = self.widgets.as_ref() else {
            return Ok((Data::new(), FieldsetErrors::default()));
        };

        let (data, mut errors) = widgets.fieldset.extract();
        self.validate(&data, &mut errors)?;

        if let Some(widgets) = self.widgets.as_mut() {
            widgets.fieldset.apply_errors(&errors);
        }
        Ok((data, errors))
    }

    /// Renders the form with the Bootstrap renderer.
    pub fn render(&self) -> String {
        BootstrapRenderer::new().render_form(self)
    }
}
