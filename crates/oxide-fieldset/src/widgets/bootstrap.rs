//! Bootstrap 5 rendering.

use ironhtml::html;
use ironhtml::typed::Element;
use ironhtml_elements::{Div, Li, Ul, H3, P};

use super::{html_escape, Renderer, WidgetAttrs};
use crate::field::{BoundField, ChoiceItem, Widget};
use crate::fields::NO_VALUE_TOKEN;
use crate::form::Form;
use crate::request::Method;

/// Renders fields and forms with Bootstrap 5 classes.
#[derive(Debug, Clone, Default)]
pub struct BootstrapRenderer;

impl BootstrapRenderer {
    /// Creates a renderer.
    pub fn new() -> Self {
        Self
    }

    fn render_text_input(&self, field: &BoundField, html_type: &str) -> String {
        let attrs = WidgetAttrs::for_field(field, "form-control");
        let value_attr = match html_type {
            "password" | "file" => String::new(),
            _ => field
                .form_value
                .as_ref()
                .map(|v| format!(r#" value="{}""#, html_escape(&v.to_string())))
                .unwrap_or_default(),
        };
        format!(r#"<input type="{html_type}" {}{value_attr}>"#, attrs.to_html())
    }

    fn render_textarea(&self, field: &BoundField, rows: usize, cols: usize) -> String {
        let attrs = WidgetAttrs::for_field(field, "form-control");
        format!(
            r#"<textarea {} rows="{rows}" cols="{cols}">{}</textarea>"#,
            attrs.to_html(),
            html_escape(&field.form_text())
        )
    }

    fn render_select(&self, field: &BoundField, multiple: bool, size: usize) -> String {
        let attrs = WidgetAttrs::for_field(field, "form-select");
        let multiple_attr = if multiple {
            format!(r#" multiple size="{size}""#)
        } else {
            String::new()
        };

        let options: String = field
            .items
            .iter()
            .map(|item| {
                let selected_attr = if item.checked { " selected" } else { "" };
                format!(
                    r#"<option value="{}"{selected_attr}>{}</option>"#,
                    html_escape(&item.value),
                    html_escape(&item.label)
                )
            })
            .collect();

        format!(
            r#"<select {}{multiple_attr}>{options}</select>"#,
            attrs.to_html()
        )
    }

    fn render_choices(&self, field: &BoundField, input_type: &str) -> String {
        let items: String = field
            .items
            .iter()
            .map(|item| render_check(item, input_type))
            .collect();
        format!(
            r#"<div id="{}" class="{}">{items}</div>"#,
            html_escape(&field.id),
            html_escape(field.klass.as_deref().unwrap_or_default())
        )
    }

    fn render_children(&self, field: &BoundField) -> String {
        let children: String = field
            .fields
            .iter()
            .flat_map(|fields| fields.fields())
            .map(|child| self.render_field(child))
            .collect();
        format!(
            r#"<div id="{}" class="{}">{children}</div>"#,
            html_escape(&field.id),
            html_escape(field.klass.as_deref().unwrap_or_default())
        )
    }
}

fn render_check(item: &ChoiceItem, input_type: &str) -> String {
    let checked_attr = if item.checked { " checked" } else { "" };
    let description = item
        .description
        .as_ref()
        .map(|d| format!(r#"<div class="form-text">{}</div>"#, html_escape(d)))
        .unwrap_or_default();

    format!(
        r#"<div class="form-check">
  <input class="form-check-input" type="{input_type}" id="{}" name="{}" value="{}"{checked_attr}>
  <label class="form-check-label" for="{}">{}</label>{description}
</div>
"#,
        html_escape(&item.id),
        html_escape(&item.name),
        html_escape(&item.value),
        html_escape(&item.id),
        html_escape(&item.label)
    )
}

impl Renderer for BootstrapRenderer {
    fn render_input(&self, field: &BoundField) -> String {
        match field.kind().widget() {
            Widget::Input { html_type } => self.render_text_input(field, html_type),
            Widget::TextArea { rows, cols } => self.render_textarea(field, rows, cols),
            Widget::Select { multiple, size } => self.render_select(field, multiple, size),
            Widget::Radio => self.render_choices(field, "radio"),
            Widget::Checkboxes => self.render_choices(field, "checkbox"),
            Widget::Composite => self.render_children(field),
        }
    }

    fn render_display(&self, field: &BoundField) -> String {
        let text = match field.kind().widget() {
            Widget::Composite => return self.render_children(field),
            Widget::Input {
                html_type: "password",
            } => String::new(),
            Widget::Select { .. } | Widget::Radio | Widget::Checkboxes => field
                .items
                .iter()
                .filter(|item| item.checked && item.value != NO_VALUE_TOKEN)
                .map(|item| item.label.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            _ => field.form_text(),
        };
        format!(
            r#"<span id="{}" class="form-control-plaintext">{}</span>"#,
            html_escape(&field.id),
            html_escape(&text)
        )
    }

    fn render_field(&self, field: &BoundField) -> String {
        let id = field.id.as_str();
        let required_marker = if field.required { " *" } else { "" };
        let label_text = format!("{}{}", field.title, required_marker);

        let label_el = html! {
            label.for_(#id).class("form-label") { #label_text }
        };

        let error = field
            .error
            .as_ref()
            .map(ToString::to_string)
            .filter(|msg| !msg.is_empty() && field.fields.is_none());
        let description = field.description.clone();

        html! { div.class("mb-3") }
            .raw(label_el.render())
            .raw(self.render_widget(field))
            .when(error.is_some(), |d| {
                d.child::<Div, _>(|e| {
                    e.class("invalid-feedback d-block")
                        .text(error.as_deref().unwrap_or(""))
                })
            })
            .when(!description.is_empty(), |d| {
                d.child::<Div, _>(|h| h.class("form-text").text(description.as_str()))
            })
            .render()
    }

    fn render_form(&self, form: &Form) -> String {
        let settings = form.get_settings();
        let action = form.action_url();
        let method = match settings.method {
            Method::Get => "get",
            Method::Post => "post",
        };
        let id = form.id();

        let mut element = html! {
            form.action(#action).method(#method)
        }
        .attr("id", &id)
        .attr("enctype", &settings.enctype)
        .class(&settings.css_class);

        if let Some(label) = &form.label {
            element = element.child::<H3, _>(|h| h.text(label.as_str()));
        }
        if !form.description.is_empty() {
            element = element.child::<P, _>(|p| p.class("text-muted").text(form.description.as_str()));
        }

        if !form.messages().is_empty() {
            element = element.child::<Div, _>(|d| {
                d.class("alert alert-danger")
                    .attr("role", "alert")
                    .child::<Ul, _>(|ul| {
                        ul.class("mb-0").children(form.messages().iter(), |msg, li: Element<Li>| {
                            li.text(msg.as_str())
                        })
                    })
            });
        }

        if settings.csrf {
            if let Some(token) = form.token() {
                let hidden = format!(
                    r#"<input type="hidden" name="{}" value="{}">"#,
                    html_escape(&settings.csrf_name),
                    html_escape(token)
                );
                element = element.child::<Div, _>(|d| d.raw(&hidden));
            }
        }

        if let Some(widgets) = form.widgets() {
            for (index, listing) in widgets.listings().iter().enumerate() {
                let fields: String = listing
                    .widgets
                    .iter()
                    .filter_map(|name| widgets.get(name))
                    .map(|field| self.render_field(field))
                    .collect();
                let listing_html = if index == 0 {
                    fields
                } else {
                    format!(
                        "<fieldset><legend>{}</legend>{fields}</fieldset>",
                        html_escape(&listing.title)
                    )
                };
                element = element.child::<Div, _>(|d| d.raw(&listing_html));
            }
        }

        let buttons: String = form
            .actions()
            .iter()
            .map(|button| {
                format!(
                    r#"<button type="submit" class="{}" id="{}" name="{}" value="{}">{}</button>"#,
                    html_escape(&button.klass),
                    html_escape(&button.id),
                    html_escape(&button.name),
                    html_escape(&button.title),
                    html_escape(&button.title)
                )
            })
            .collect();
        element = element.child::<Div, _>(|d| d.class("form-actions").raw(&buttons));

        element.render()
    }
}
