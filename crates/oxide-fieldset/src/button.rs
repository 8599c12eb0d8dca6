//! Form buttons and the actions they trigger.

use std::fmt;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{FormError, Result};
use crate::form::Form;
use crate::params::Params;
use crate::value::Data;

/// What a button handler hands back to the caller of [`Form::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Send the client elsewhere.
    Redirect(String),
    /// Data for the caller to render or store.
    Data(Data),
}

/// Handler run when a button is activated. Receives the extracted data when
/// the button was declared with `extract`.
pub type Action = Arc<dyn Fn(&mut Form, Option<Data>) -> Result<Option<Outcome>> + Send + Sync>;

/// Predicate deciding whether a button is shown for a form.
pub type Condition = Arc<dyn Fn(&Form) -> bool + Send + Sync>;

/// Visual weight of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionType {
    /// Plain button.
    #[default]
    Default,
    /// Main action of the form.
    Primary,
    /// Destructive action.
    Danger,
    /// Confirming action.
    Success,
    /// Informational action.
    Info,
    /// Action needing attention.
    Warning,
}

impl ActionType {
    /// Bootstrap css class for this type.
    pub fn css_class(self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::Primary => Some("btn-primary"),
            Self::Danger => Some("btn-danger"),
            Self::Success => Some("btn-success"),
            Self::Info => Some("btn-info"),
            Self::Warning => Some("btn-warning"),
        }
    }
}

/// A submit button of a form.
#[derive(Clone)]
pub struct Button {
    name: String,
    title: String,
    action: Option<Action>,
    action_type: ActionType,
    condition: Option<Condition>,
    extract: bool,
}

impl fmt::Debug for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Button")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("action_type", &self.action_type)
            .field("extract", &self.extract)
            .finish_non_exhaustive()
    }
}

impl Default for Button {
    fn default() -> Self {
        Self::new("submit")
    }
}

impl Button {
    /// Creates a button. Whitespace in `name` becomes `_`; the title
    /// defaults to the capitalized name.
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        let title = capitalize(&name);
        Self {
            name: name
                .chars()
                .map(|c| if c.is_whitespace() { '_' } else { c })
                .collect(),
            title,
            action: None,
            action_type: ActionType::Default,
            condition: None,
            extract: false,
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the handler.
    #[must_use]
    pub fn action(
        mut self,
        action: impl Fn(&mut Form, Option<Data>) -> Result<Option<Outcome>> + Send + Sync + 'static,
    ) -> Self {
        self.action = Some(Arc::new(action));
        self
    }

    /// Sets the action type.
    #[must_use]
    pub fn action_type(mut self, action_type: ActionType) -> Self {
        self.action_type = action_type;
        self
    }

    /// Shows the button only when `condition` holds for the form.
    #[must_use]
    pub fn condition(mut self, condition: impl Fn(&Form) -> bool + Send + Sync + 'static) -> Self {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Extracts the form before running the handler and passes the data on.
    /// The handler is skipped when extraction reports errors.
    #[must_use]
    pub fn extract(mut self) -> Self {
        self.extract = true;
        self
    }

    /// Returns the normalized name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the title.
    pub fn get_title(&self) -> &str {
        &self.title
    }

    /// Returns the action type.
    pub fn get_action_type(&self) -> ActionType {
        self.action_type
    }

    /// Returns whether the button is shown for `form`.
    pub fn is_available(&self, form: &Form) -> bool {
        self.condition.as_ref().is_none_or(|condition| condition(form))
    }

    /// Binds the button under `prefix` against the submitted parameters.
    pub fn bind(&self, prefix: &str, params: &Params) -> BoundButton {
        let name = format!("{prefix}{}", self.name);
        let klass = match self.action_type.css_class() {
            Some(css) => format!("btn {css}"),
            None => "btn".to_string(),
        };
        BoundButton {
            id: name.replace('.', "-"),
            activated: params.contains(&name),
            name,
            title: self.title.clone(),
            klass,
            button: self.clone(),
        }
    }

    /// Runs the handler against `form`.
    pub fn call(&self, form: &mut Form) -> Result<Option<Outcome>> {
        let action = self
            .action
            .clone()
            .ok_or_else(|| FormError::NoAction(self.name.clone()))?;

        let data = if self.extract {
            let (data, errors) = form.extract()?;
            if !errors.is_empty() {
                form.add_errors(&errors);
                return Ok(None);
            }
            Some(data)
        } else {
            None
        };

        action(form, data)
    }
}

/// A button bound to a request.
#[derive(Debug, Clone)]
pub struct BoundButton {
    /// Html id.
    pub id: String,
    /// Prefixed parameter name.
    pub name: String,
    /// Title.
    pub title: String,
    /// Css classes.
    pub klass: String,
    activated: bool,
    button: Button,
}

impl BoundButton {
    /// Returns whether the button was submitted.
    pub fn activated(&self) -> bool {
        self.activated
    }

    /// Returns the button template.
    pub fn button(&self) -> &Button {
        &self.button
    }
}

static IDENTIFIER_RE: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][a-zA-Z0-9_]*$"));

/// Derives a button name from a title: identifiers are lowercased, anything
/// else is hex-encoded.
pub fn create_btn_id(title: &str) -> String {
    let is_identifier = IDENTIFIER_RE
        .as_ref()
        .is_ok_and(|re| re.is_match(title));
    if is_identifier {
        title.to_lowercase()
    } else {
        title.bytes().map(|b| format!("{b:02x}")).collect()
    }
}

/// Ordered buttons of a form.
#[derive(Debug, Clone, Default)]
pub struct Buttons {
    buttons: IndexMap<String, Button>,
}

impl Buttons {
    /// Creates an empty set of buttons.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a button, failing when the name is taken.
    pub fn add(&mut self, button: Button) -> Result<()> {
        if self.buttons.contains_key(button.name()) {
            return Err(FormError::DuplicateName(button.name().to_string()));
        }
        self.buttons.insert(button.name().to_string(), button);
        Ok(())
    }

    /// Builder form of [`Buttons::add`].
    pub fn with(mut self, button: Button) -> Result<Self> {
        self.add(button)?;
        Ok(self)
    }

    /// Adds a button titled `title` whose name is derived from the title.
    pub fn add_action(
        &mut self,
        title: &str,
        action: impl Fn(&mut Form, Option<Data>) -> Result<Option<Outcome>> + Send + Sync + 'static,
    ) -> Result<()> {
        self.add(Button::new(create_btn_id(title)).title(title).action(action))
    }

    /// Like [`Buttons::add_action`] but the handler receives extracted data.
    pub fn add_data_action(
        &mut self,
        title: &str,
        action: impl Fn(&mut Form, Option<Data>) -> Result<Option<Outcome>> + Send + Sync + 'static,
    ) -> Result<()> {
        self.add(
            Button::new(create_btn_id(title))
                .title(title)
                .action(action)
                .extract(),
        )
    }

    /// Concatenates two sets of buttons.
    pub fn merge(&self, other: &Buttons) -> Result<Self> {
        let mut merged = self.clone();
        for button in other.iter() {
            merged.add(button.clone())?;
        }
        Ok(merged)
    }

    /// Returns a button by name.
    pub fn get(&self, name: &str) -> Option<&Button> {
        self.buttons.get(name)
    }

    /// Returns the buttons in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Button> {
        self.buttons.values()
    }

    /// Returns the number of buttons.
    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    /// Returns whether there are no buttons.
    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }
}

/// The buttons of a form bound to its parameters.
#[derive(Debug, Clone, Default)]
pub struct Actions {
    actions: IndexMap<String, BoundButton>,
}

impl Actions {
    /// Parameter prefix of every button, appended to the form prefix.
    pub const PREFIX: &'static str = "buttons.";

    /// Binds every available button of `form`.
    pub fn bind(form: &Form) -> Self {
        let prefix = format!("{}{}", form.get_settings().prefix, Self::PREFIX);
        let params = form.form_params();

        let actions = form
            .get_buttons()
            .iter()
            .filter(|button| button.is_available(form))
            .map(|button| (button.name().to_string(), button.bind(&prefix, params)))
            .collect();
        Self { actions }
    }

    /// Returns a bound button by its unprefixed name.
    pub fn get(&self, name: &str) -> Option<&BoundButton> {
        self.actions.get(name)
    }

    /// Returns the bound buttons in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &BoundButton> {
        self.actions.values()
    }

    /// Returns the templates of the submitted buttons.
    pub fn activated(&self) -> Vec<Button> {
        self.actions
            .values()
            .filter(|action| action.activated())
            .map(|action| action.button().clone())
            .collect()
    }

    /// Returns the number of bound buttons.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns whether no button is bound.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Form, _: Option<Data>) -> Result<Option<Outcome>> {
        Ok(None)
    }

    #[test]
    fn test_button_ctor() {
        let button = Button::default();
        assert_eq!(button.name(), "submit");
        assert_eq!(button.get_title(), "Submit");

        let button = Button::new("save draft");
        assert_eq!(button.name(), "save_draft");
        assert_eq!(button.get_title(), "Save draft");
    }

    #[test]
    fn test_button_bind() {
        let params = Params::new().with("form.buttons.save", "Save");
        let bound = Button::new("save")
            .action_type(ActionType::Primary)
            .bind("form.buttons.", &params);

        assert_eq!(bound.name, "form.buttons.save");
        assert_eq!(bound.id, "form-buttons-save");
        assert_eq!(bound.klass, "btn btn-primary");
        assert!(bound.activated());

        let bound = Button::new("cancel").bind("form.buttons.", &params);
        assert_eq!(bound.klass, "btn");
        assert!(!bound.activated());
    }

    #[test]
    fn test_action_type_css() {
        assert_eq!(ActionType::Warning.css_class(), Some("btn-warning"));
        assert_eq!(ActionType::Default.css_class(), None);
    }

    #[test]
    fn test_create_btn_id() {
        assert_eq!(create_btn_id("Save"), "save");
        assert_eq!(create_btn_id("Save_2"), "save_2");
        assert_eq!(create_btn_id("Save it"), "53617665206974");
        assert_eq!(create_btn_id("1st"), "317374");
    }

    #[test]
    fn test_buttons_reject_duplicates() {
        let mut buttons = Buttons::new();
        buttons.add(Button::new("save")).unwrap();
        let err = buttons.add(Button::new("save")).unwrap_err();
        assert!(matches!(err, FormError::DuplicateName(name) if name == "save"));
    }

    #[test]
    fn test_add_action() {
        let mut buttons = Buttons::new();
        buttons.add_action("Cancel", noop).unwrap();
        buttons.add_data_action("Save", noop).unwrap();

        let names: Vec<_> = buttons.iter().map(Button::name).collect();
        assert_eq!(names, vec!["cancel", "save"]);
        assert_eq!(buttons.get("cancel").unwrap().get_title(), "Cancel");
        assert!(buttons.get("save").unwrap().extract);
    }

    #[test]
    fn test_merge() {
        let first = Buttons::new().with(Button::new("a")).unwrap();
        let second = Buttons::new().with(Button::new("b")).unwrap();
        let merged = first.merge(&second).unwrap();
        assert_eq!(merged.len(), 2);
        assert!(first.merge(&first).is_err());
    }
}
