//! Input artifact handling: existence check and text preview for prompting.

use std::path::Path;
use std::time::Duration;

use log::{debug, warn};

use crate::config::InputConfig;
use crate::error::{ParsesmithError, Result};
use crate::process;

pub const PREVIEW_UNAVAILABLE: &str = "(Document text preview unavailable.)";

/// Fail when the input document is missing or not a regular file
pub fn ensure_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(ParsesmithError::InputArtifact(format!(
            "Input file not found: {}",
            path.display()
        )));
    }
    Ok(())
}

/// Extract a bounded text preview of the input document.
///
/// Never fails: a missing extractor, a non-zero exit, a timeout or empty
/// output all yield `PREVIEW_UNAVAILABLE` and a warning.
pub async fn extract_preview(path: &Path, config: &InputConfig) -> String {
    let path_str = path.to_string_lossy();
    let args = process::substitute(&config.preview_args, &[("input", path_str.as_ref())]);
    let timeout = Duration::from_millis(config.preview_timeout_ms);

    debug!("Extracting preview: {} {:?}", config.preview_program, args);

    let output = match process::run(&config.preview_program, &args, timeout).await {
        Ok(output) => output,
        Err(e) => {
            warn!("Preview command '{}' could not start: {}", config.preview_program, e);
            return PREVIEW_UNAVAILABLE.to_string();
        }
    };

    if output.timed_out {
        warn!("Preview command timed out after {}ms", config.preview_timeout_ms);
        return PREVIEW_UNAVAILABLE.to_string();
    }
    if !output.success() {
        warn!(
            "Preview command exited with {:?}: {}",
            output.exit_code,
            output.stderr.trim()
        );
        return PREVIEW_UNAVAILABLE.to_string();
    }

    let text = output.stdout.trim();
    if text.is_empty() {
        warn!("Preview command produced no text for {}", path.display());
        return PREVIEW_UNAVAILABLE.to_string();
    }

    truncate_chars(text, config.max_preview_chars)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}\n... (truncated)", &text[..cut]),
        None => text.to_string(),
    }
}
