//! The harness: a fresh process that loads one candidate and prints its table.

use std::path::Path;
use std::time::Duration;

use log::debug;

use crate::config::HarnessConfig;
use crate::domain::ExceptionDescription;
use crate::error::{ParsesmithError, Result};
use crate::process::{self, ProcessOutput};
use crate::table::Table;

/// Python harness passed via `python3 -c`. argv: source, input, entry point.
///
/// Imports the source as a new module and calls the entry point with the
/// candidate's own stdout redirected to stderr, then writes the returned
/// DataFrame as CSV to the real stdout. Any exception becomes
/// `Type: message` on stderr and exit status 1.
pub const DEFAULT_PYTHON_HARNESS: &str = r#"import contextlib
import importlib.util
import sys

source_path, input_path, entry_point = sys.argv[1], sys.argv[2], sys.argv[3]
table_out = sys.stdout
try:
    with contextlib.redirect_stdout(sys.stderr):
        spec = importlib.util.spec_from_file_location("candidate_parser", source_path)
        module = importlib.util.module_from_spec(spec)
        spec.loader.exec_module(module)
        func = getattr(module, entry_point, None)
        if func is None:
            raise AttributeError("module has no function '" + entry_point + "'")
        result = func(input_path)
    if not hasattr(result, "to_csv"):
        raise TypeError(
            entry_point + " returned " + type(result).__name__ + ", expected a pandas DataFrame"
        )
    result.to_csv(table_out, index=False)
except Exception as e:
    message = " ".join(str(e).split())
    sys.stderr.write(type(e).__name__ + ": " + message + "\n")
    sys.exit(1)
"#;

/// What one harness run produced
#[derive(Debug)]
pub enum HarnessRun {
    /// Exit 0 and stdout parsed as a table
    Table(Table),
    /// The candidate failed; retriable
    Fault(ExceptionDescription),
}

/// Run the harness for `source_path` against `input_path`.
///
/// `Err` only when the harness program cannot be spawned.
pub async fn execute(
    config: &HarnessConfig,
    source_path: &Path,
    input_path: &Path,
) -> Result<HarnessRun> {
    let source = source_path.to_string_lossy();
    let input = input_path.to_string_lossy();
    // `harness` goes last so placeholders inside its text are left alone
    let args = process::substitute(
        &config.args,
        &[
            ("source", source.as_ref()),
            ("input", input.as_ref()),
            ("entry_point", config.entry_point.as_str()),
            ("harness", DEFAULT_PYTHON_HARNESS),
        ],
    );

    debug!("Harness: {} (source {})", config.program, source);

    let timeout = Duration::from_millis(config.timeout_ms);
    let output = process::run(&config.program, &args, timeout)
        .await
        .map_err(|e| {
            ParsesmithError::Sandbox(format!(
                "Failed to start harness '{}': {}",
                config.program, e
            ))
        })?;

    debug!(
        "Harness finished: exit={:?} timed_out={} in {}ms",
        output.exit_code,
        output.timed_out,
        output.duration.as_millis()
    );

    Ok(interpret(&output, config.timeout_ms))
}

/// Classify a finished harness process
pub fn interpret(output: &ProcessOutput, timeout_ms: u64) -> HarnessRun {
    if output.timed_out {
        return HarnessRun::Fault(ExceptionDescription::new(
            Some("Timeout".to_string()),
            format!("Parser did not finish within {}ms", timeout_ms),
        ));
    }

    if !output.success() {
        return HarnessRun::Fault(fault_from_stderr(&output.stderr, output.exit_code));
    }

    if output.stdout.trim().is_empty() {
        return HarnessRun::Fault(ExceptionDescription::new(
            Some("InvalidOutput".to_string()),
            "Parser produced no output table",
        ));
    }

    match Table::from_csv_str(&output.stdout) {
        Ok(table) => HarnessRun::Table(table),
        Err(e) => HarnessRun::Fault(ExceptionDescription::new(
            Some("InvalidOutput".to_string()),
            format!("Output is not a valid CSV table: {}", e),
        )),
    }
}

/// Build a description from the last non-empty stderr line
pub fn fault_from_stderr(stderr: &str, exit_code: Option<i32>) -> ExceptionDescription {
    let description = match stderr.lines().rev().map(str::trim).find(|l| !l.is_empty()) {
        Some(line) => parse_fault_line(line),
        None => ExceptionDescription::new(
            None,
            match exit_code {
                Some(code) => format!("Process exited with code {} and no error output", code),
                None => "Process was terminated by a signal".to_string(),
            },
        ),
    };
    description.with_exit_code(exit_code)
}

/// Split `Type: message` when `Type` looks like an identifier (dots allowed)
pub fn parse_fault_line(line: &str) -> ExceptionDescription {
    if let Some((kind, message)) = line.split_once(": ")
        && is_type_name(kind)
    {
        return ExceptionDescription::new(Some(kind.to_string()), message.trim());
    }
    ExceptionDescription::new(None, line)
}

fn is_type_name(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        })
}
