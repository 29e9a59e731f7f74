//! Handlebars-backed renderer.

use super::{RenderError, TemplateRenderer};
use handlebars::Handlebars;
use serde_json::Value;

/// Default [`TemplateRenderer`] built on `handlebars`.
///
/// HTML escaping is disabled. A template made of exactly one `{{ path }}`
/// expression that resolves in the scope yields the referenced value itself,
/// so lists and objects survive rendering. Anything else renders to a string.
#[derive(Debug, Clone)]
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        Self { registry }
    }
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, template: &str, scope: &Value) -> Result<Value, RenderError> {
        if let Some(value) = single_expression(template).and_then(|path| lookup(scope, path)) {
            return Ok(value.clone());
        }

        self.registry
            .render_template(template, scope)
            .map(Value::String)
            .map_err(|e| RenderError {
                template: template.to_string(),
                reason: e.to_string(),
            })
    }
}

/// The path inside `{{ ... }}` when the template is nothing but one plain
/// path expression.
fn single_expression(template: &str) -> Option<&str> {
    let inner = template
        .trim()
        .strip_prefix("{{")?
        .strip_suffix("}}")?
        .trim();

    let is_path = !inner.is_empty()
        && inner
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '[' | ']'));

    is_path.then_some(inner)
}

fn lookup<'a>(scope: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(scope, |current, segment| {
        let segment = segment.trim_start_matches('[').trim_end_matches(']');
        match current {
            Value::Object(entries) => entries.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    })
}
