//! Everything that has to be loaded once before the loop starts.

use log::info;

use crate::config::{HarnessConfig, InputConfig};
use crate::domain::Target;
use crate::error::{ParsesmithError, Result};
use crate::generator::GenerationContext;
use crate::input;
use crate::table::Table;

/// Check the input, load the reference, and build the generation context.
///
/// A missing input or an unreadable reference is fatal; a failed preview is not.
pub async fn prepare(
    target: &Target,
    input_config: &InputConfig,
    harness: &HarnessConfig,
) -> Result<(GenerationContext, Table)> {
    input::ensure_exists(&target.input_path)?;
    let reference = load_reference(target)?;

    let input_preview = input::extract_preview(&target.input_path, input_config).await;

    let (rows, cols) = reference.shape();
    info!(
        "Reference for '{}': {} rows x {} columns from {}",
        target.id,
        rows,
        cols,
        target.reference_path.display()
    );

    let context = GenerationContext {
        target_id: target.id.clone(),
        input_path: target.input_path.clone(),
        input_preview,
        columns: reference.schema(),
        expected_rows: rows,
        entry_point: harness.entry_point.clone(),
        source_file: target.source_file_name(),
    };

    Ok((context, reference))
}

fn load_reference(target: &Target) -> Result<Table> {
    let path = &target.reference_path;
    if !path.is_file() {
        return Err(ParsesmithError::Reference(format!(
            "Reference file not found: {}",
            path.display()
        )));
    }

    let table = Table::from_csv_path(path).map_err(|e| {
        ParsesmithError::Reference(format!("Failed to read {}: {}", path.display(), e))
    })?;

    if table.columns().is_empty() {
        return Err(ParsesmithError::Reference(format!(
            "Reference {} has no columns",
            path.display()
        )));
    }
    Ok(table)
}
