//! Target resolution - a named extraction task and where its files live.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::PathsConfig;
use crate::error::{ParsesmithError, Result};

/// A named extraction task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    /// Document the parser must read
    pub input_path: PathBuf,
    /// Ground-truth CSV
    pub reference_path: PathBuf,
    /// Where candidate source is persisted; the final artifact on success
    pub source_path: PathBuf,
}

impl Target {
    /// Resolve a target id into paths. The id is lower-cased and must be a
    /// plain name (letters, digits, `_`, `-`) since it is spliced into paths.
    pub fn resolve(id: &str, paths: &PathsConfig) -> Result<Self> {
        let id = id.trim().to_lowercase();
        if id.is_empty() {
            return Err(ParsesmithError::Config("Target id must not be empty".to_string()));
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(ParsesmithError::Config(format!(
                "Invalid target id '{}': use letters, digits, '_' or '-'",
                id
            )));
        }

        let fill = |template: &str| template.replace("{target}", &id);
        let target_dir = paths.data_dir.join(&id);

        Ok(Self {
            input_path: target_dir.join(fill(&paths.input_file)),
            reference_path: target_dir.join(fill(&paths.reference_file)),
            source_path: paths.parsers_dir.join(fill(&paths.source_file)),
            id,
        })
    }

    /// File name of the persisted source
    pub fn source_file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
