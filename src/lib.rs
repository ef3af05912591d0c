//! Parsesmith - a bounded self-correction loop for LLM-written parsers
//!
//! An LLM writes a parser for a target document, the parser runs in a fresh
//! process, its output table is compared to a reference, and failures are fed
//! back as a correction request. At most `runner::MAX_ATTEMPTS` attempts.

pub mod config;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod input;
pub mod llm;
pub mod process;
pub mod prompt;
pub mod runner;
pub mod table;
pub mod tester;

pub use error::{ParsesmithError, Result};
