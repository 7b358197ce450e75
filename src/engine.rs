use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use thiserror::Error;

use crate::templates;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template '{name}' failed: {detail}")]
    Template { name: String, detail: String },
    #[error("Failed to serialize config document: {0}")]
    Config(#[from] serde_yaml::Error),
}

/// TemplateEngine wraps minijinja::Environment with the bundled templates registered.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> Result<Self, RenderError> {
        let mut env = Environment::new();
        // Any slot a template uses without a value is an error, never an empty string.
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);

        env.add_filter("snakecase", crate::filters::snakecase);
        env.add_filter("kebabcase", crate::filters::kebabcase);
        env.add_filter("pyrepr", crate::filters::pyrepr);

        for &(name, source) in templates::ALL {
            env.add_template(name, source)
                .map_err(|e| template_error(name, source, e))?;
        }
        Ok(Self { env })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Renders a registered template with the given context.
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String, RenderError> {
        let source = templates::ALL
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, s)| *s)
            .unwrap_or("");
        let template = self
            .env
            .get_template(name)
            .map_err(|e| template_error(name, source, e))?;
        template
            .render(context)
            .map_err(|e| template_error(name, source, e))
    }
}

fn template_error(name: &str, source: &str, e: minijinja::Error) -> RenderError {
    let detail = match e.line() {
        Some(line) => {
            let error_line = source.lines().nth(line.saturating_sub(1)).unwrap_or("");
            format!("{}\n{}", e, error_line)
        }
        None => e.to_string(),
    };
    RenderError::Template {
        name: name.to_string(),
        detail,
    }
}
