//! Testing a candidate: persist it, execute it in isolation, compare to the reference.

pub mod harness;
mod sandbox;

use async_trait::async_trait;

use crate::domain::{Target, TestOutcome};
use crate::error::Result;
use crate::table::Table;

pub use harness::DEFAULT_PYTHON_HARNESS;
pub use sandbox::{SandboxedTester, persist_source};

/// One call, one verdict. No internal retries.
///
/// `Err` is reserved for environment faults (cannot write the source, cannot
/// start the harness). Anything the candidate does wrong is a failing
/// `TestOutcome`.
#[async_trait]
pub trait Tester: Send + Sync {
    async fn run(&self, target: &Target, source: &str, reference: &Table) -> Result<TestOutcome>;
}
