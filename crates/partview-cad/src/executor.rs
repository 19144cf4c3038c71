//! External tool execution.
//!
//! Runs converter tools as child processes with a timeout, output
//! capture, a global concurrency limit, and a scratch directory per
//! attempt.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use partview_core::config::renderer::RendererConfig;

/// Errors from running an external tool.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The process did not finish in time and was killed.
    #[error("Process timed out after {0} seconds")]
    Timeout(u64),

    /// The process exited with a non-zero code.
    #[error("Process failed with exit code {code}: {stderr}")]
    Failed {
        /// The exit code, or -1 when terminated by a signal.
        code: i32,
        /// Captured standard error, truncated.
        stderr: String,
    },

    /// The process could not be started or waited on.
    #[error("IO error running process: {0}")]
    Io(#[from] std::io::Error),

    /// The concurrency limiter was shut down.
    #[error("Process limiter closed")]
    LimiterClosed,
}

/// What a finished process produced.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Wall-clock duration.
    pub duration: Duration,
}

/// Runs external converters.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    temp_root: PathBuf,
    timeout: Duration,
    limiter: Arc<Semaphore>,
}

impl ProcessRunner {
    /// Create a runner from renderer settings.
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            temp_root: config.effective_temp_root(),
            timeout: Duration::from_secs(config.process_timeout_seconds),
            limiter: Arc::new(Semaphore::new(config.max_concurrent_processes)),
        }
    }

    /// Substitute `{input}`, `{output}`, `{input_dir}` and `{output_dir}`
    /// in an argument template.
    pub fn substitute_args(template: &[String], input: &Path, output: &Path) -> Vec<String> {
        let input_str = input.to_string_lossy();
        let output_str = output.to_string_lossy();
        let input_dir = input
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let output_dir = output
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        template
            .iter()
            .map(|arg| {
                arg.replace("{input_dir}", &input_dir)
                    .replace("{output_dir}", &output_dir)
                    .replace("{input}", &input_str)
                    .replace("{output}", &output_str)
            })
            .collect()
    }

    /// Run `program` with `args` and wait for it.
    pub async fn run(&self, program: &Path, args: &[String]) -> Result<ProcessOutput, ProcessError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| ProcessError::LimiterClosed)?;

        let start = Instant::now();
        debug!(program = %program.display(), ?args, "Running external tool");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = tokio::time::timeout(self.timeout, cmd.output()).await;
        let duration = start.elapsed();

        match result {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();

                if !output.status.success() {
                    let code = output.status.code().unwrap_or(-1);
                    warn!(
                        program = %program.display(),
                        code,
                        stderr = %stderr.chars().take(500).collect::<String>(),
                        "External tool failed"
                    );
                    return Err(ProcessError::Failed {
                        code,
                        stderr: stderr.chars().take(2000).collect(),
                    });
                }

                info!(
                    program = %program.display(),
                    duration_ms = duration.as_millis() as u64,
                    "External tool completed"
                );
                Ok(ProcessOutput {
                    stdout,
                    stderr,
                    duration,
                })
            }
            Ok(Err(e)) => {
                error!(program = %program.display(), error = %e, "Failed to start external tool");
                Err(ProcessError::Io(e))
            }
            Err(_) => {
                warn!(
                    program = %program.display(),
                    timeout_secs = self.timeout.as_secs(),
                    "External tool timed out"
                );
                Err(ProcessError::Timeout(self.timeout.as_secs()))
            }
        }
    }

    /// Create a fresh scratch directory for one attempt.
    pub async fn create_job_dir(&self) -> std::io::Result<JobDir> {
        let path = self
            .temp_root
            .join("render")
            .join(uuid::Uuid::new_v4().simple().to_string());
        tokio::fs::create_dir_all(&path).await?;
        Ok(JobDir {
            path,
            removed: false,
        })
    }
}

/// A per-attempt scratch directory, removed by [`JobDir::cleanup`] or,
/// failing that, when dropped.
#[derive(Debug)]
pub struct JobDir {
    path: PathBuf,
    removed: bool,
}

impl JobDir {
    /// The directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create and return a subdirectory.
    pub async fn subdir(&self, name: &str) -> std::io::Result<PathBuf> {
        let dir = self.path.join(name);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Remove the directory and everything in it.
    pub async fn cleanup(mut self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.path).await {
            warn!(path = %self.path.display(), error = %e, "Failed to remove scratch directory");
        }
        self.removed = true;
    }
}

impl Drop for JobDir {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        // unwinding or an early return skipped cleanup()
        if let Err(e) = std::fs::remove_dir_all(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %e, "Failed to remove scratch directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(temp: &Path, timeout: u64) -> ProcessRunner {
        ProcessRunner::new(&RendererConfig {
            temp_root: Some(temp.to_path_buf()),
            process_timeout_seconds: timeout,
            ..Default::default()
        })
    }

    #[test]
    fn test_substitute_args() {
        let args = ProcessRunner::substitute_args(
            &[
                "{input}".to_string(),
                "-o".to_string(),
                "{output}".to_string(),
                "{input_dir}".to_string(),
            ],
            Path::new("/tmp/job/in/part.step"),
            Path::new("/tmp/job/out/part.stl"),
        );
        assert_eq!(
            args,
            vec![
                "/tmp/job/in/part.step",
                "-o",
                "/tmp/job/out/part.stl",
                "/tmp/job/in"
            ]
        );
    }

    #[tokio::test]
    async fn test_job_dir_lifecycle() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = runner(temp.path(), 5);
        let job = runner.create_job_dir().await.expect("job dir");
        let input = job.subdir("in").await.expect("subdir");
        assert!(input.is_dir());

        let root = job.path().to_path_buf();
        job.cleanup().await;
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_dropped_job_dir_is_removed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = runner(temp.path(), 5);
        let job = runner.create_job_dir().await.expect("job dir");
        job.subdir("out").await.expect("subdir");
        let root = job.path().to_path_buf();
        drop(job);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_job_dir_removed_when_attempt_panics() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = runner(temp.path(), 5);
        let job = runner.create_job_dir().await.expect("job dir");
        let root = job.path().to_path_buf();

        let outcome = tokio::spawn(async move {
            let input = job.subdir("in").await.expect("subdir");
            assert!(input.is_dir());
            panic!("converter crashed");
        })
        .await;
        assert!(outcome.expect_err("panicked").is_panic());
        assert!(!root.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = runner(temp.path(), 5);
        let result = runner
            .run(Path::new("sh"), &["-c".to_string(), "echo bad >&2; exit 3".to_string()])
            .await;
        match result {
            Err(ProcessError::Failed { code, stderr }) => {
                assert_eq!(code, 3);
                assert!(stderr.contains("bad"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = runner(temp.path(), 1);
        let result = runner
            .run(Path::new("sh"), &["-c".to_string(), "sleep 5".to_string()])
            .await;
        assert!(matches!(result, Err(ProcessError::Timeout(1))));
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let runner = runner(temp.path(), 5);
        let result = runner
            .run(Path::new("/nonexistent/partview-tool"), &[])
            .await;
        assert!(matches!(result, Err(ProcessError::Io(_))));
    }
}
