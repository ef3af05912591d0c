//! Tester that persists the candidate and runs it in a fresh harness process

use std::path::Path;

use async_trait::async_trait;
use log::{debug, info};

use super::Tester;
use super::harness::{self, HarnessRun};
use crate::config::{ComparisonConfig, HarnessConfig};
use crate::domain::{Target, TestOutcome};
use crate::error::{ParsesmithError, Result};
use crate::table::{Table, compare};

pub struct SandboxedTester {
    harness: HarnessConfig,
    comparison: ComparisonConfig,
}

impl SandboxedTester {
    pub fn new(harness: HarnessConfig, comparison: ComparisonConfig) -> Self {
        Self { harness, comparison }
    }
}

/// Write `source` to `path`, creating parent directories
pub fn persist_source(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            ParsesmithError::Sandbox(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    std::fs::write(path, source)
        .map_err(|e| ParsesmithError::Sandbox(format!("Failed to write {}: {}", path.display(), e)))
}

#[async_trait]
impl Tester for SandboxedTester {
    async fn run(&self, target: &Target, source: &str, reference: &Table) -> Result<TestOutcome> {
        persist_source(&target.source_path, source)?;
        debug!("Wrote {} bytes to {}", source.len(), target.source_path.display());

        let run = harness::execute(&self.harness, &target.source_path, &target.input_path).await?;
        let table = match run {
            HarnessRun::Table(table) => table,
            HarnessRun::Fault(description) => {
                info!("Candidate raised: {}", description.headline());
                return Ok(TestOutcome::exception(description));
            }
        };

        match compare(&table, reference, &self.comparison) {
            None => Ok(TestOutcome::pass()),
            Some(report) => {
                info!("{}", report.headline());
                Ok(TestOutcome::mismatch(report))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::MismatchKind;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Runs the candidate as a shell script: `sh {source} {input}`
    fn sh_harness() -> HarnessConfig {
        HarnessConfig {
            program: "sh".to_string(),
            args: vec!["{source}".to_string(), "{input}".to_string()],
            entry_point: "parse".to_string(),
            timeout_ms: 5000,
        }
    }

    fn target(dir: &Path) -> Target {
        let input = dir.join("input.txt");
        std::fs::write(&input, "a,b\n1,2\n").unwrap();
        Target {
            id: "demo".to_string(),
            input_path: input,
            reference_path: dir.join("result.csv"),
            source_path: dir.join("parsers").join("demo_parser.sh"),
        }
    }

    fn reference() -> Table {
        Table::from_rows(&["a", "b"], &[&["1", "2"]])
    }

    fn tester() -> SandboxedTester {
        SandboxedTester::new(sh_harness(), ComparisonConfig::default())
    }

    #[tokio::test]
    async fn test_matching_output_passes() {
        let temp = TempDir::new().unwrap();
        let target = target(temp.path());

        let outcome = tester().run(&target, "cat \"$1\"", &reference()).await.unwrap();
        assert!(outcome.success);
        assert!(outcome.diagnosis.is_none());
        // Source is persisted under a freshly created directory
        assert_eq!(std::fs::read_to_string(&target.source_path).unwrap(), "cat \"$1\"");
    }

    #[tokio::test]
    async fn test_raising_candidate_gives_exception_only() {
        let temp = TempDir::new().unwrap();
        let target = target(temp.path());

        let source = "echo 'KeyError: Balance' >&2\nexit 1";
        let outcome = tester().run(&target, source, &reference()).await.unwrap();
        assert!(!outcome.success);
        let e = outcome.exception_description().unwrap();
        assert_eq!(e.kind.as_deref(), Some("KeyError"));
        assert_eq!(e.message, "Balance");
        assert!(outcome.mismatch_report().is_none());
    }

    #[tokio::test]
    async fn test_wrong_cell_gives_mismatch() {
        let temp = TempDir::new().unwrap();
        let target = target(temp.path());

        let source = "printf 'a,b\\n1,3\\n'";
        let outcome = tester().run(&target, source, &reference()).await.unwrap();
        let report = outcome.mismatch_report().unwrap();
        assert!(report.has(MismatchKind::Values));
        assert_eq!(report.cell_diffs[0].column, "b");
        assert_eq!(report.cell_diffs[0].expected, "2");
        assert_eq!(report.cell_diffs[0].actual, "3");
        assert!(outcome.exception_description().is_none());
    }

    #[tokio::test]
    async fn test_overwrites_previous_source() {
        let temp = TempDir::new().unwrap();
        let target = target(temp.path());

        tester().run(&target, "exit 1", &reference()).await.unwrap();
        tester().run(&target, "cat \"$1\"", &reference()).await.unwrap();
        assert_eq!(std::fs::read_to_string(&target.source_path).unwrap(), "cat \"$1\"");
    }

    #[tokio::test]
    async fn test_timeout_is_candidate_fault() {
        let temp = TempDir::new().unwrap();
        let target = target(temp.path());
        let mut harness = sh_harness();
        harness.timeout_ms = 200;

        let outcome = SandboxedTester::new(harness, ComparisonConfig::default())
            .run(&target, "sleep 5", &reference())
            .await
            .unwrap();
        assert_eq!(outcome.exception_description().unwrap().kind.as_deref(), Some("Timeout"));
    }

    #[tokio::test]
    async fn test_unwritable_sink_is_sandbox_error() {
        let temp = TempDir::new().unwrap();
        let mut target = target(temp.path());
        // A regular file where a directory is needed
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        target.source_path = blocker.join("sub").join("demo_parser.sh");

        let result = tester().run(&target, "true", &reference()).await;
        assert!(matches!(result, Err(ParsesmithError::Sandbox(_))));
    }

    #[test]
    fn test_persist_source_into_existing_dir() {
        let temp = TempDir::new().unwrap();
        let path: PathBuf = temp.path().join("x.py");
        persist_source(&path, "x = 1").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "x = 1");
    }

    #[tokio::test]
    async fn test_python_parser_that_prints_still_passes() {
        let has_python = std::process::Command::new("python3")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if !has_python {
            return;
        }
        let temp = TempDir::new().unwrap();
        let mut target = target(temp.path());
        target.source_path = temp.path().join("parsers").join("demo_parser.py");

        let source = r#"
class Frame:
    def to_csv(self, out, index=True):
        out.write("a,b\n1,2\n")


def parse(pdf_path):
    print("Parsing", pdf_path)
    return Frame()
"#;
        let tester = SandboxedTester::new(HarnessConfig::default(), ComparisonConfig::default());
        let outcome = tester.run(&target, source, &reference()).await.unwrap();
        assert!(outcome.success, "diagnosis: {:?}", outcome.diagnosis);
    }
}
