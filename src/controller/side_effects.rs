//! Post-capture side effects: the batch update script and the version-control
//! commit of fresh artifacts.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::process::Command;

use crate::error_handling::types::ExecutorError;

#[async_trait]
pub trait SideEffectExecutor: Send + Sync {
    /// Runs the batch capture script and returns its exit code.
    async fn run_batch_capture(&self, mode: &str, flags: &[String]) -> Result<i32, ExecutorError>;

    /// Stages `paths` and commits them with `message`.
    async fn commit(&self, paths: &[PathBuf], message: &str) -> Result<(), ExecutorError>;
}

/// Runs `bash <script>` and `git` inside the repository root.
pub struct ShellExecutor {
    batch_script: Option<PathBuf>,
    repo_root: PathBuf,
}

impl ShellExecutor {
    pub fn new<P: AsRef<Path>>(batch_script: Option<PathBuf>, repo_root: P) -> Self {
        Self {
            batch_script,
            repo_root: repo_root.as_ref().to_path_buf(),
        }
    }

    async fn git(&self, args: &[&str]) -> Result<(), ExecutorError> {
        let command = format!("git {}", args.join(" "));
        debug!("Running `{}` in {}", command, self.repo_root.display());
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ExecutorError::SpawnFailed(command.clone(), e))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ExecutorError::CommandFailed {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}

#[async_trait]
impl SideEffectExecutor for ShellExecutor {
    async fn run_batch_capture(&self, mode: &str, flags: &[String]) -> Result<i32, ExecutorError> {
        let script = match self.batch_script {
            Some(ref script) => script,
            None => {
                debug!("No batch script configured, nothing to run");
                return Ok(0);
            }
        };

        let command = format!("bash {} {} {}", script.display(), mode, flags.join(" "));
        info!("Running batch capture: {}", command.trim_end());
        let status = Command::new("bash")
            .arg(script)
            .arg(mode)
            .args(flags)
            .current_dir(&self.repo_root)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| ExecutorError::SpawnFailed(command.clone(), e))?;

        match status.code() {
            Some(code) => Ok(code),
            None => {
                warn!("Batch script terminated by signal");
                Err(ExecutorError::CommandFailed {
                    command,
                    code: None,
                    stderr: String::new(),
                })
            }
        }
    }

    async fn commit(&self, paths: &[PathBuf], message: &str) -> Result<(), ExecutorError> {
        let paths: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        let mut add = vec!["add", "--"];
        add.extend(paths.iter().map(String::as_str));
        self.git(&add).await?;
        self.git(&["commit", "-m", message]).await?;
        info!("Committed: {}", message);
        Ok(())
    }
}
