//! Test outcome types.
//!
//! A `TestOutcome` is the verdict of running one candidate parser. Failures
//! carry a `Diagnosis`, which renders into the natural-language correction
//! request sent with the next generation call.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::table::MismatchReport;

/// The candidate raised (or crashed, or timed out) instead of returning a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionDescription {
    /// Fault type, e.g. `ValueError`, `Timeout`, `InvalidOutput`
    pub kind: Option<String>,
    pub message: String,
    pub exit_code: Option<i32>,
}

impl ExceptionDescription {
    pub fn new(kind: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            exit_code: None,
        }
    }

    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    /// `Kind: message`, or just the message when the kind is unknown
    pub fn headline(&self) -> String {
        match &self.kind {
            Some(kind) => format!("{}: {}", kind, self.message),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for ExceptionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "The parser raised an error instead of returning a table.")?;
        writeln!(f, "Error: {}", self.headline())?;
        if let Some(code) = self.exit_code {
            writeln!(f, "Exit code: {}", code)?;
        }
        write!(
            f,
            "Check for syntax errors, missing imports (like 'pandas' as 'pd'), \
             and that the entry point exists with the required signature."
        )
    }
}

/// Why an attempt failed. Exactly one variant per failing outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Diagnosis {
    Exception(ExceptionDescription),
    Mismatch(MismatchReport),
}

impl Diagnosis {
    /// One-line summary for terminal output
    pub fn headline(&self) -> String {
        match self {
            Diagnosis::Exception(e) => e.headline(),
            Diagnosis::Mismatch(m) => m.headline(),
        }
    }

    pub fn exception(&self) -> Option<&ExceptionDescription> {
        match self {
            Diagnosis::Exception(e) => Some(e),
            Diagnosis::Mismatch(_) => None,
        }
    }

    pub fn mismatch(&self) -> Option<&MismatchReport> {
        match self {
            Diagnosis::Exception(_) => None,
            Diagnosis::Mismatch(m) => Some(m),
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnosis::Exception(e) => write!(f, "{}", e),
            Diagnosis::Mismatch(m) => write!(f, "{}", m),
        }
    }
}

/// Verdict of one test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub success: bool,
    pub diagnosis: Option<Diagnosis>,
}

impl TestOutcome {
    pub fn pass() -> Self {
        Self {
            success: true,
            diagnosis: None,
        }
    }

    pub fn exception(description: ExceptionDescription) -> Self {
        Self {
            success: false,
            diagnosis: Some(Diagnosis::Exception(description)),
        }
    }

    pub fn mismatch(report: MismatchReport) -> Self {
        Self {
            success: false,
            diagnosis: Some(Diagnosis::Mismatch(report)),
        }
    }

    pub fn exception_description(&self) -> Option<&ExceptionDescription> {
        self.diagnosis.as_ref().and_then(Diagnosis::exception)
    }

    pub fn mismatch_report(&self) -> Option<&MismatchReport> {
        self.diagnosis.as_ref().and_then(Diagnosis::mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComparisonConfig;
    use crate::table::{Table, compare};

    #[test]
    fn test_pass_has_no_diagnosis() {
        let outcome = TestOutcome::pass();
        assert!(outcome.success);
        assert!(outcome.diagnosis.is_none());
        assert!(outcome.exception_description().is_none());
        assert!(outcome.mismatch_report().is_none());
    }

    #[test]
    fn test_exception_outcome() {
        let outcome = TestOutcome::exception(
            ExceptionDescription::new(Some("KeyError".into()), "'Balance'").with_exit_code(Some(1)),
        );
        assert!(!outcome.success);
        assert!(outcome.mismatch_report().is_none());
        let exc = outcome.exception_description().unwrap();
        assert_eq!(exc.headline(), "KeyError: 'Balance'");

        let rendered = outcome.diagnosis.unwrap().to_string();
        assert!(rendered.contains("Error: KeyError: 'Balance'"));
        assert!(rendered.contains("Exit code: 1"));
    }

    #[test]
    fn test_exception_headline_without_kind() {
        let exc = ExceptionDescription::new(None, "Segmentation fault");
        assert_eq!(exc.headline(), "Segmentation fault");
    }

    #[test]
    fn test_mismatch_outcome() {
        let expected = Table::from_rows(&["a"], &[&["1"]]);
        let actual = Table::from_rows(&["a"], &[&["2"]]);
        let report = compare(&actual, &expected, &ComparisonConfig::default()).unwrap();

        let outcome = TestOutcome::mismatch(report);
        assert!(!outcome.success);
        assert!(outcome.exception_description().is_none());
        assert!(outcome.mismatch_report().is_some());
        assert!(
            outcome
                .diagnosis
                .as_ref()
                .unwrap()
                .headline()
                .starts_with("Output does not match reference")
        );
    }

    #[test]
    fn test_diagnosis_serialization_tag() {
        let diagnosis = Diagnosis::Exception(ExceptionDescription::new(None, "boom"));
        let json = serde_json::to_value(&diagnosis).unwrap();
        assert_eq!(json["type"], "exception");
        assert_eq!(json["message"], "boom");
    }
}
