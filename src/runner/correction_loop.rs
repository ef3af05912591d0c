//! Correction loop - generate, test, evaluate, and retry with feedback.
//!
//! The loop is an explicit state machine. Every phase transition is a value
//! of `LoopPhase`; the driver matches on it until a terminal phase produces
//! the `LoopOutcome`. Each generation call gets a fresh context: the only
//! thing carried between attempts is the previous source and its diagnosis.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::config::LoopConfig;
use crate::domain::{
    Attempt, Diagnosis, ExceptionDescription, PendingAttempt, Target, source_digest,
};
use crate::evaluator::{Verdict, decide};
use crate::generator::{CodeGenerator, GenerationContext, PriorAttempt};
use crate::table::Table;
use crate::tester::{Tester, persist_source};

/// Attempt ceiling. Fixed, not configurable.
pub const MAX_ATTEMPTS: u32 = 3;

/// Mutable state owned by one loop run
#[derive(Debug, Clone)]
pub struct LoopState {
    pub target_id: String,
    /// Incremented before each generation; never exceeds `budget`
    pub attempt: u32,
    pub budget: u32,
    /// `None` until the first failure
    pub feedback: Option<PriorAttempt>,
}

impl LoopState {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            attempt: 0,
            budget: MAX_ATTEMPTS,
            feedback: None,
        }
    }
}

#[derive(Debug)]
enum LoopPhase {
    Init,
    Generating,
    Testing(PendingAttempt),
    Evaluating(Attempt),
    DoneSuccess,
    DoneFailure(Diagnosis),
    Aborted(String),
}

impl LoopPhase {
    fn name(&self) -> &'static str {
        match self {
            LoopPhase::Init => "init",
            LoopPhase::Generating => "generating",
            LoopPhase::Testing(_) => "testing",
            LoopPhase::Evaluating(_) => "evaluating",
            LoopPhase::DoneSuccess => "done-success",
            LoopPhase::DoneFailure(_) => "done-failure",
            LoopPhase::Aborted(_) => "aborted",
        }
    }
}

/// How a loop run ended
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoopOutcome {
    /// The persisted source at `artifact` reproduces the reference
    Succeeded { artifact: PathBuf },
    /// Budget used up; carries the final attempt's diagnosis
    Exhausted { diagnosis: Diagnosis },
    /// A fatal fault stopped the loop regardless of remaining budget
    Aborted { reason: String },
}

/// Result of one loop run
#[derive(Debug, Clone, Serialize)]
pub struct LoopReport {
    pub target_id: String,
    pub outcome: LoopOutcome,
    /// Attempts that reached a test verdict, in order
    pub attempts: Vec<Attempt>,
    /// Value of the attempt counter when the loop stopped
    pub attempt_count: u32,
}

impl LoopReport {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, LoopOutcome::Succeeded { .. })
    }

    /// Diagnosis to show the operator: the exhausted one, or the last recorded failure
    pub fn last_diagnosis(&self) -> Option<&Diagnosis> {
        match &self.outcome {
            LoopOutcome::Exhausted { diagnosis } => Some(diagnosis),
            _ => self
                .attempts
                .iter()
                .rev()
                .find_map(|a| a.outcome.diagnosis.as_ref()),
        }
    }

    /// Process exit status: 0 success, 1 exhausted, 2 aborted
    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            LoopOutcome::Succeeded { .. } => 0,
            LoopOutcome::Exhausted { .. } => 1,
            LoopOutcome::Aborted { .. } => 2,
        }
    }
}

pub struct CorrectionLoop<G, T>
where
    G: CodeGenerator,
    T: Tester,
{
    generator: Arc<G>,
    tester: Arc<T>,
    config: LoopConfig,
}

impl<G, T> CorrectionLoop<G, T>
where
    G: CodeGenerator,
    T: Tester,
{
    pub fn new(generator: Arc<G>, tester: Arc<T>) -> Self {
        Self::with_config(generator, tester, LoopConfig::default())
    }

    pub fn with_config(generator: Arc<G>, tester: Arc<T>, config: LoopConfig) -> Self {
        Self {
            generator,
            tester,
            config,
        }
    }

    /// Run the loop for one target until success, exhaustion or a fatal fault.
    pub async fn run(
        &self,
        target: &Target,
        context: &GenerationContext,
        reference: &Table,
    ) -> LoopReport {
        let mut state = LoopState::new(&target.id);
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut phase = LoopPhase::Init;

        info!("Starting correction loop for '{}' (budget {})", target.id, state.budget);

        let outcome = loop {
            debug!("[{}] phase: {}", target.id, phase.name());

            phase = match phase {
                LoopPhase::Init => {
                    state.attempt = 0;
                    state.feedback = None;
                    match remove_source(target) {
                        Ok(()) => LoopPhase::Generating,
                        Err(reason) => LoopPhase::Aborted(reason),
                    }
                }

                LoopPhase::Generating => {
                    state.attempt += 1;
                    info!("[{}] attempt {}/{}: generating", target.id, state.attempt, state.budget);

                    match self.generator.generate(context, state.feedback.as_ref()).await {
                        Ok(source) => {
                            if let Some(previous) = attempts.last()
                                && previous.digest == source_digest(&source)
                            {
                                warn!(
                                    "[{}] attempt {} produced the same source as attempt {}",
                                    target.id, state.attempt, previous.index
                                );
                            }
                            let feedback = state
                                .feedback
                                .as_ref()
                                .map(|p| p.feedback.clone())
                                .unwrap_or_default();
                            LoopPhase::Testing(PendingAttempt::new(state.attempt, source, feedback))
                        }
                        Err(e) => LoopPhase::Aborted(format!(
                            "Generation failed on attempt {}: {}",
                            state.attempt, e
                        )),
                    }
                }

                LoopPhase::Testing(pending) => {
                    info!("[{}] attempt {}/{}: testing", target.id, pending.index, state.budget);

                    match self.tester.run(target, &pending.source, reference).await {
                        Ok(outcome) => LoopPhase::Evaluating(pending.finish(outcome)),
                        Err(e) => LoopPhase::Aborted(format!(
                            "Testing failed on attempt {}: {}",
                            pending.index, e
                        )),
                    }
                }

                LoopPhase::Evaluating(attempt) => {
                    let verdict = decide(&attempt.outcome, attempt.index, state.budget);
                    debug!("[{}] attempt {} verdict: {:?}", target.id, attempt.index, verdict);

                    let next = match verdict {
                        Verdict::TerminateSuccess => {
                            match persist_source(&target.source_path, &attempt.source) {
                                Ok(()) => LoopPhase::DoneSuccess,
                                Err(e) => LoopPhase::Aborted(format!(
                                    "Failed to persist final artifact: {}",
                                    e
                                )),
                            }
                        }
                        Verdict::Retry => {
                            let diagnosis = diagnosis_of(&attempt);
                            info!(
                                "[{}] attempt {} failed: {}",
                                target.id,
                                attempt.index,
                                diagnosis.headline()
                            );
                            state.feedback = Some(PriorAttempt {
                                attempt: attempt.index,
                                source: attempt.source.clone(),
                                feedback: diagnosis.to_string(),
                            });
                            LoopPhase::Generating
                        }
                        Verdict::TerminateFailure => LoopPhase::DoneFailure(diagnosis_of(&attempt)),
                    };
                    attempts.push(attempt);
                    next
                }

                LoopPhase::DoneSuccess => {
                    info!(
                        "[{}] succeeded on attempt {}: {}",
                        target.id,
                        state.attempt,
                        target.source_path.display()
                    );
                    break LoopOutcome::Succeeded {
                        artifact: target.source_path.clone(),
                    };
                }

                LoopPhase::DoneFailure(diagnosis) => {
                    warn!(
                        "[{}] exhausted {} attempts; last failure: {}",
                        target.id,
                        state.budget,
                        diagnosis.headline()
                    );
                    self.discard_failed_source(target);
                    break LoopOutcome::Exhausted { diagnosis };
                }

                LoopPhase::Aborted(reason) => {
                    error!("[{}] aborted: {}", target.id, reason);
                    self.discard_failed_source(target);
                    break LoopOutcome::Aborted { reason };
                }
            };
        };

        LoopReport {
            target_id: target.id.clone(),
            outcome,
            attempts,
            attempt_count: state.attempt,
        }
    }

    fn discard_failed_source(&self, target: &Target) {
        if self.config.keep_failed_source {
            info!("Keeping failed source at {}", target.source_path.display());
            return;
        }
        if let Err(reason) = remove_source(target) {
            warn!("{}", reason);
        }
    }
}

/// A failing outcome always carries a diagnosis; this guards hand-built ones
fn diagnosis_of(attempt: &Attempt) -> Diagnosis {
    attempt.outcome.diagnosis.clone().unwrap_or_else(|| {
        Diagnosis::Exception(ExceptionDescription::new(
            None,
            format!("Attempt {} failed without a diagnosis", attempt.index),
        ))
    })
}

fn remove_source(target: &Target) -> std::result::Result<(), String> {
    if !target.source_path.exists() {
        return Ok(());
    }
    debug!("Removing {}", target.source_path.display());
    std::fs::remove_file(&target.source_path)
        .map_err(|e| format!("Failed to remove {}: {}", target.source_path.display(), e))
}
