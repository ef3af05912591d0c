//! Domain types for Parsesmith
//!
//! - Target: a named extraction task and its file locations
//! - Attempt: one generate-then-test cycle
//! - TestOutcome / Diagnosis: the verdict of one test run and why it failed

pub mod attempt;
pub mod outcome;
pub mod target;

pub use attempt::{Attempt, PendingAttempt, source_digest};
pub use outcome::{Diagnosis, ExceptionDescription, TestOutcome};
pub use target::Target;
