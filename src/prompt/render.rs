//! Prompt Renderer - Render templates with context variables using Handlebars
//!
//! This module provides the PromptRenderer struct which uses Handlebars to
//! render prompt templates with context variables.

use handlebars::Handlebars;
use serde::Serialize;

use super::loader::PromptLoader;
use super::templates::TEMPLATE_NAMES;
use crate::error::{ParsesmithError, Result};

/// Renders prompt templates using Handlebars templating
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer {
    /// Create a new PromptRenderer with no templates registered
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // Prompts carry code and tables; never HTML-escape them
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Create a renderer with every known template registered from `loader`
    pub fn from_loader(loader: &PromptLoader) -> Result<Self> {
        let mut renderer = Self::new();
        for name in TEMPLATE_NAMES {
            let text = loader.load(name)?;
            renderer.register_template(name, &text)?;
        }
        Ok(renderer)
    }

    /// Renderer with the built-in templates
    pub fn with_defaults() -> Result<Self> {
        Self::from_loader(&PromptLoader::embedded())
    }

    /// Render a template string with any serializable context
    pub fn render_with<T: Serialize>(&self, template: &str, context: &T) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .map_err(|e| ParsesmithError::Template(format!("Failed to render template: {}", e)))
    }

    /// Register a named template for later use
    pub fn register_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| {
                ParsesmithError::Template(format!("Failed to register template '{}': {}", name, e))
            })
    }

    /// Render a previously registered template
    pub fn render_named<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        self.handlebars
            .render(name, context)
            .map_err(|e| {
                ParsesmithError::Template(format!("Failed to render template '{}': {}", name, e))
            })
    }

    /// Check if a named template is registered
    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.get_template(name).is_some()
    }
}
