//! CodeGenerator backed by an LLM client

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::json;

use super::extract::extract_code_block;
use super::{CodeGenerator, GenerationContext, PriorAttempt};
use crate::error::{ParsesmithError, Result};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompt::PromptRenderer;
use crate::prompt::templates::{FIX_SYSTEM, FIX_USER, GENERATE_SYSTEM, GENERATE_USER};

/// Generates parser source with one fresh-context completion per call.
pub struct LlmCodeGenerator<L: LlmClient> {
    llm: Arc<L>,
    renderer: PromptRenderer,
    max_tokens: u32,
    /// When set, prompts and raw responses are written here
    prompt_dump_dir: Option<PathBuf>,
}

impl<L: LlmClient> LlmCodeGenerator<L> {
    pub fn new(llm: Arc<L>, renderer: PromptRenderer, max_tokens: u32) -> Self {
        Self {
            llm,
            renderer,
            max_tokens,
            prompt_dump_dir: None,
        }
    }

    pub fn with_prompt_dump(mut self, dir: Option<PathBuf>) -> Self {
        self.prompt_dump_dir = dir;
        self
    }

    /// Build the request for this attempt: generate prompt first, fix prompt on retries
    pub fn build_request(
        &self,
        context: &GenerationContext,
        prior: Option<&PriorAttempt>,
    ) -> Result<CompletionRequest> {
        let (system, user) = match prior {
            None => (
                self.renderer.render_named(GENERATE_SYSTEM, context)?,
                self.renderer.render_named(GENERATE_USER, context)?,
            ),
            Some(prior) => {
                let vars = json!({
                    "attempt": prior.attempt,
                    "previous_source": prior.source,
                    "feedback": prior.feedback,
                    "columns": context.columns,
                    "expected_rows": context.expected_rows,
                    "entry_point": context.entry_point,
                    "source_file": context.source_file,
                });
                (
                    self.renderer.render_named(FIX_SYSTEM, &vars)?,
                    self.renderer.render_named(FIX_USER, &vars)?,
                )
            }
        };

        Ok(CompletionRequest::new(system)
            .with_user_message(user)
            .with_max_tokens(self.max_tokens))
    }

    fn dump(&self, target_id: &str, attempt: u32, request: &CompletionRequest, response: &str) {
        let Some(dir) = &self.prompt_dump_dir else {
            return;
        };
        if let Err(e) = write_dump(dir, target_id, attempt, request, response) {
            warn!("Failed to save prompts to {}: {}", dir.display(), e);
        }
    }
}

fn write_dump(
    dir: &Path,
    target_id: &str,
    attempt: u32,
    request: &CompletionRequest,
    response: &str,
) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let prompt = format!(
        "# System\n\n{}\n\n# User\n\n{}\n",
        request.system,
        request.last_user_message().unwrap_or_default()
    );
    std::fs::write(dir.join(format!("{}-attempt-{}-prompt.md", target_id, attempt)), prompt)?;
    std::fs::write(dir.join(format!("{}-attempt-{}-response.md", target_id, attempt)), response)?;
    Ok(())
}

#[async_trait]
impl<L: LlmClient> CodeGenerator for LlmCodeGenerator<L> {
    async fn generate(
        &self,
        context: &GenerationContext,
        prior: Option<&PriorAttempt>,
    ) -> Result<String> {
        let attempt = prior.map(|p| p.attempt + 1).unwrap_or(1);
        let request = self.build_request(context, prior)?;

        info!(
            "Requesting {} for target '{}' (attempt {}, model {})",
            if prior.is_some() { "fix" } else { "parser" },
            context.target_id,
            attempt,
            self.llm.model()
        );

        let response = self.llm.complete(request.clone()).await?;
        debug!(
            "Response: {} chars, {} output tokens",
            response.content.len(),
            response.usage.output_tokens
        );
        if response.stop_reason.is_truncated() {
            warn!("Response hit max_tokens ({}); source may be cut off", self.max_tokens);
        }

        self.dump(&context.target_id, attempt, &request, &response.content);

        let source = extract_code_block(&response.content);
        if source.is_empty() {
            return Err(ParsesmithError::Generation(
                "Model returned no source code".to_string(),
            ));
        }
        Ok(source)
    }
}
