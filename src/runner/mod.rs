//! Loop orchestration: preparing a target and driving the correction loop.

mod correction_loop;
mod prepare;

pub use correction_loop::{CorrectionLoop, LoopOutcome, LoopReport, LoopState, MAX_ATTEMPTS};
pub use prepare::prepare;
