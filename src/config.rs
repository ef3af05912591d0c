use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ParsesmithError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub paths: PathsConfig,
    pub input: InputConfig,
    pub harness: HarnessConfig,
    pub comparison: ComparisonConfig,
    pub prompts: PromptsConfig,
    #[serde(rename = "loop")]
    pub loop_: LoopConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com/v1/messages".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 8192,
            timeout_ms: 300000,
        }
    }
}

/// Where targets live on disk. `{target}` is replaced with the target id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub parsers_dir: PathBuf,
    pub input_file: String,
    pub reference_file: String,
    pub source_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            parsers_dir: PathBuf::from("custom_parsers"),
            input_file: "{target} sample.pdf".to_string(),
            reference_file: "result.csv".to_string(),
            source_file: "{target}_parser.py".to_string(),
        }
    }
}

/// External command used to pull a text preview out of the input document.
/// `{input}` is replaced with the input path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub preview_program: String,
    pub preview_args: Vec<String>,
    pub preview_timeout_ms: u64,
    pub max_preview_chars: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            preview_program: "pdftotext".to_string(),
            preview_args: vec![
                "-f".to_string(),
                "1".to_string(),
                "-l".to_string(),
                "1".to_string(),
                "-layout".to_string(),
                "{input}".to_string(),
                "-".to_string(),
            ],
            preview_timeout_ms: 30000,
            max_preview_chars: 8000,
        }
    }
}

/// Command that loads a candidate parser in a fresh process and prints its table as CSV.
///
/// Placeholders: `{harness}` (the embedded Python harness), `{source}`, `{input}`, `{entry_point}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub program: String,
    pub args: Vec<String>,
    pub entry_point: String,
    pub timeout_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec![
                "-c".to_string(),
                "{harness}".to_string(),
                "{source}".to_string(),
                "{input}".to_string(),
                "{entry_point}".to_string(),
            ],
            entry_point: "parse".to_string(),
            timeout_ms: 120000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub column_order_sensitive: bool,
    pub row_order_sensitive: bool,
    /// Absolute tolerance for numeric cells; `None` means exact
    pub float_tolerance: Option<f64>,
    /// Cap on reported cell diffs and preview rows
    pub max_diffs: usize,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            column_order_sensitive: true,
            row_order_sensitive: true,
            float_tolerance: None,
            max_diffs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory of `<name>.md` files overriding the embedded templates
    pub templates_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Leave the last failing source on disk instead of removing it
    pub keep_failed_source: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub save_prompts: bool,
    pub prompts_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            paths: PathsConfig::default(),
            input: InputConfig::default(),
            harness: HarnessConfig::default(),
            comparison: ComparisonConfig::default(),
            prompts: PromptsConfig::default(),
            loop_: LoopConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        // Primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir
                .join(project_name)
                .join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!(
                            "Failed to load config from {}: {}",
                            primary_config.display(),
                            e
                        );
                    }
                }
            }
        }

        // Fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ParsesmithError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            ParsesmithError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        log::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Directory for saved prompts, defaulting to the log directory
    pub fn prompts_dir(&self) -> Option<PathBuf> {
        if !self.debug.save_prompts {
            return None;
        }
        Some(self.debug.prompts_dir.clone().unwrap_or_else(|| log_dir().join("prompts")))
    }
}

/// `{data_local_dir}/parsesmith/logs`
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(env!("CARGO_PKG_NAME"))
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.paths.parsers_dir, PathBuf::from("custom_parsers"));
        assert_eq!(config.harness.entry_point, "parse");
        assert!(config.comparison.column_order_sensitive);
        assert!(config.comparison.row_order_sensitive);
        assert_eq!(config.comparison.float_tolerance, None);
        assert_eq!(config.comparison.max_diffs, 5);
        assert!(!config.loop_.keep_failed_source);
    }

    #[test]
    fn test_load_partial_yaml_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("parsesmith.yml");
        fs::write(
            &path,
            r#"
llm:
  model: claude-3-haiku-20240307
comparison:
  float_tolerance: 0.01
  row_order_sensitive: false
loop:
  keep_failed_source: true
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.llm.model, "claude-3-haiku-20240307");
        assert_eq!(config.llm.max_tokens, 8192);
        assert_eq!(config.comparison.float_tolerance, Some(0.01));
        assert!(!config.comparison.row_order_sensitive);
        assert!(config.comparison.column_order_sensitive);
        assert!(config.loop_.keep_failed_source);
        assert_eq!(config.harness.program, "python3");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let missing = PathBuf::from("/nonexistent/parsesmith.yml");
        let err = Config::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, ParsesmithError::Config(_)));
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yml");
        fs::write(&path, "llm: [not, a, map").unwrap();
        assert!(Config::load_from_file(&path).is_err());
    }

    #[test]
    fn test_prompts_dir_only_when_enabled() {
        let mut config = Config::default();
        assert!(config.prompts_dir().is_none());

        config.debug.save_prompts = true;
        config.debug.prompts_dir = Some(PathBuf::from("/tmp/prompts"));
        assert_eq!(config.prompts_dir(), Some(PathBuf::from("/tmp/prompts")));
    }
}
