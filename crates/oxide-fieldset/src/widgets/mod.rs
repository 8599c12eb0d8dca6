//! Rendering of bound fields and forms to HTML.

mod bootstrap;

pub use bootstrap::BootstrapRenderer;

use indexmap::IndexMap;

use crate::field::{BoundField, Mode};
use crate::form::Form;

/// Attributes of a rendered element, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetAttrs {
    /// HTML attributes.
    pub attrs: IndexMap<String, String>,
}

impl WidgetAttrs {
    /// Creates new empty widget attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the attributes every control of `field` carries: id, name
    /// and the css class, with `base_class` first.
    pub fn for_field(field: &BoundField, base_class: &str) -> Self {
        let mut class = base_class.to_string();
        if let Some(klass) = field.klass.as_deref().filter(|k| !k.is_empty()) {
            class = format!("{class} {klass}");
        }
        if field.error.is_some() {
            class.push_str(" is-invalid");
        }
        Self::new()
            .with("id", &field.id)
            .with("name", &field.name)
            .with("class", class)
    }

    /// Sets an attribute.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Gets an attribute.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.attrs.get(key)
    }

    /// Renders attributes as an HTML attribute string with escaped values.
    pub fn to_html(&self) -> String {
        self.attrs
            .iter()
            .map(|(k, v)| format!(r#"{k}="{}""#, html_escape(v)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Builder method to set an attribute.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }
}

/// Turns bound fields and forms into HTML.
pub trait Renderer {
    /// Renders the editable control of a field.
    fn render_input(&self, field: &BoundField) -> String;

    /// Renders the read-only value of a field.
    fn render_display(&self, field: &BoundField) -> String;

    /// Renders a field with its label, description and error.
    fn render_field(&self, field: &BoundField) -> String;

    /// Renders a whole form.
    fn render_form(&self, form: &Form) -> String;

    /// Renders the control matching the field's mode.
    fn render_widget(&self, field: &BoundField) -> String {
        match field.mode {
            Some(Mode::Display) => self.render_display(field),
            _ => self.render_input(field),
        }
    }
}

/// Escapes HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
