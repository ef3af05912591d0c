//! Prompt System - Template loading and rendering
//!
//! Embedded templates for the first and corrective generation calls, optional
//! on-disk overrides, and Handlebars rendering.

mod loader;
mod render;
pub mod templates;

pub use loader::PromptLoader;
pub use render::PromptRenderer;
