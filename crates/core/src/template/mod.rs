//! Template rendering capability.
//!
//! The engine treats expression syntax as opaque: it only knows that a
//! string containing `{{` is a template and hands it, together with a JSON
//! scope, to a [`TemplateRenderer`]. Lists and maps are walked element-wise
//! by [`render_tree`]; every other value passes through untouched.

mod handlebars_renderer;

pub use handlebars_renderer::HandlebarsRenderer;

use serde_json::{Map, Value};
use thiserror::Error;

/// Error raised when a template cannot be rendered.
///
/// Always carries the offending template text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to render template `{template}`: {reason}")]
pub struct RenderError {
    pub template: String,
    pub reason: String,
}

/// Renders a single template string against a scope.
///
/// Implementations must be deterministic and must not mutate the scope.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, scope: &Value) -> Result<Value, RenderError>;
}

/// Whether a string should be sent through the renderer.
pub fn is_template(value: &str) -> bool {
    value.contains("{{")
}

/// Render every template string inside `value`, returning a new tree.
pub fn render_tree(
    renderer: &dyn TemplateRenderer,
    value: &Value,
    scope: &Value,
) -> Result<Value, RenderError> {
    match value {
        Value::String(text) if is_template(text) => renderer.render(text, scope),
        Value::Array(items) => items
            .iter()
            .map(|item| render_tree(renderer, item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(entries) => entries
            .iter()
            .map(|(key, item)| Ok((key.clone(), render_tree(renderer, item, scope)?)))
            .collect::<Result<Map<_, _>, RenderError>>()
            .map(Value::Object),
        other => Ok(other.clone()),
    }
}

/// Truthiness of a rendered condition.
///
/// Renderers usually produce strings, so the usual spellings of "false"
/// count as false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => {
            let text = text.trim();
            !(text.is_empty()
                || ["false", "0", "no", "off", "none", "null"]
                    .iter()
                    .any(|falsy| text.eq_ignore_ascii_case(falsy)))
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(entries) => !entries.is_empty(),
    }
}
