//! Outcome evaluation - pure routing decision after each test.

use crate::domain::TestOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    TerminateSuccess,
    TerminateFailure,
    Retry,
}

/// Decide what happens after `attempt` (1-based) out of `budget`.
pub fn decide(outcome: &TestOutcome, attempt: u32, budget: u32) -> Verdict {
    if outcome.success {
        Verdict::TerminateSuccess
    } else if attempt < budget {
        Verdict::Retry
    } else {
        Verdict::TerminateFailure
    }
}
