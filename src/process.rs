//! Child process execution with a timeout.
//!
//! Used for the input preview command and the sandbox harness. Every call
//! spawns a brand-new process; nothing is reused between calls.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;

/// Captured result of a finished (or timed out) process
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// `None` when killed by a signal or timed out
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Replace `{key}` placeholders in each argument
pub fn substitute(args: &[String], vars: &[(&str, &str)]) -> Vec<String> {
    args.iter()
        .map(|arg| {
            vars.iter()
                .fold(arg.clone(), |acc, (key, value)| acc.replace(&format!("{{{}}}", key), value))
        })
        .collect()
}

/// Run `program args..` and wait up to `timeout`.
///
/// Spawn failures (program missing, permission denied) are returned as `Err`;
/// a timeout kills the child and returns `Ok` with `timed_out` set.
pub async fn run(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> std::io::Result<ProcessOutput> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn()?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => {
            let output = result?;
            Ok(ProcessOutput {
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                timed_out: false,
                duration: start.elapsed(),
            })
        }
        // The future owning the child is dropped here, which kills it
        Err(_) => Ok(ProcessOutput {
            exit_code: None,
            timed_out: true,
            duration: start.elapsed(),
            ..Default::default()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_substitute() {
        let out = substitute(
            &args(&["{source}", "--in={input}", "plain"]),
            &[("source", "a.py"), ("input", "b c.pdf")],
        );
        assert_eq!(out, args(&["a.py", "--in=b c.pdf", "plain"]));
    }

    #[tokio::test]
    async fn test_run_captures_output() {
        let script = args(&["-c", "echo out; echo err >&2"]);
        let out = run("sh", &script, Duration::from_secs(5)).await.unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_run_nonzero_exit() {
        let out = run("sh", &args(&["-c", "exit 3"]), Duration::from_secs(5)).await.unwrap();
        assert!(!out.success());
        assert_eq!(out.exit_code, Some(3));
    }

    #[tokio::test]
    async fn test_run_timeout() {
        let out = run("sh", &args(&["-c", "sleep 10"]), Duration::from_millis(100))
            .await
            .unwrap();
        assert!(out.timed_out);
        assert!(!out.success());
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let result = run("nonexistent_program_xyz123", &[], Duration::from_secs(5)).await;
        assert!(result.is_err());
    }
}
