//! Prompt Loader - resolve template text, preferring on-disk overrides
//!
//! Templates ship embedded in the binary. When a templates directory is
//! configured, a `<name>.md` file there replaces the embedded text.

use std::path::{Path, PathBuf};

use super::templates;
use crate::error::{ParsesmithError, Result};

pub struct PromptLoader {
    /// Optional directory of `<name>.md` overrides
    templates_dir: Option<PathBuf>,
}

impl PromptLoader {
    pub fn new(templates_dir: Option<impl AsRef<Path>>) -> Self {
        Self {
            templates_dir: templates_dir.map(|d| d.as_ref().to_path_buf()),
        }
    }

    /// Loader that only uses the embedded templates
    pub fn embedded() -> Self {
        Self { templates_dir: None }
    }

    /// Load a template by name
    pub fn load(&self, name: &str) -> Result<String> {
        if let Some(path) = self.template_path(name)
            && path.exists()
        {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                ParsesmithError::Template(format!(
                    "Failed to load template '{}' from {:?}: {}",
                    name, path, e
                ))
            })?;
            log::debug!("Using template override {}", path.display());
            return Ok(content);
        }

        templates::embedded(name)
            .map(str::to_string)
            .ok_or_else(|| ParsesmithError::Template(format!("Unknown template '{}'", name)))
    }

    fn template_path(&self, name: &str) -> Option<PathBuf> {
        self.templates_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.md", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_embedded() {
        let loader = PromptLoader::embedded();
        let text = loader.load(templates::FIX_SYSTEM).unwrap();
        assert!(text.contains("debugging agent"));
    }

    #[test]
    fn test_load_unknown_template() {
        let loader = PromptLoader::embedded();
        assert!(matches!(loader.load("missing"), Err(ParsesmithError::Template(_))));
    }

    #[test]
    fn test_override_wins() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("generate_system.md"), "Custom system prompt").unwrap();

        let loader = PromptLoader::new(Some(temp.path()));
        assert_eq!(loader.load(templates::GENERATE_SYSTEM).unwrap(), "Custom system prompt");
        // Names without an override fall back to the embedded text
        assert!(loader.load(templates::FIX_SYSTEM).unwrap().contains("debugging agent"));
    }
}
