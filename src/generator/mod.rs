//! Code generation - turn target context (and, on retries, feedback) into parser source.

mod extract;
mod llm_generator;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::table::ColumnSchema;

pub use extract::extract_code_block;
pub use llm_generator::LlmCodeGenerator;

/// Everything the generator may know about a target. No reference cell values.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationContext {
    pub target_id: String,
    pub input_path: PathBuf,
    /// First-page text, or a placeholder when extraction failed
    pub input_preview: String,
    pub columns: Vec<ColumnSchema>,
    pub expected_rows: usize,
    pub entry_point: String,
    /// File name the source will be persisted under
    pub source_file: String,
}

/// The previous attempt, sent back on retries
#[derive(Debug, Clone, Serialize)]
pub struct PriorAttempt {
    /// Ordinal of the failed attempt
    pub attempt: u32,
    pub source: String,
    /// Rendered diagnosis
    pub feedback: String,
}

#[async_trait]
pub trait CodeGenerator: Send + Sync {
    /// Produce complete parser source. `prior` is `None` on the first attempt.
    async fn generate(
        &self,
        context: &GenerationContext,
        prior: Option<&PriorAttempt>,
    ) -> Result<String>;
}
