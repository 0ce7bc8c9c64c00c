//! Shell Command Execution using tokio::process

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    process::ProcessExecutor,
};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, warn};

/// Executes rendered commands through the platform shell
///
/// The command string is passed to `sh -c` on Unix and `cmd /C` on Windows,
/// so templates may use pipes, redirects, and quoting the way they would in
/// a terminal. Stdout is captured and returned; a non-zero exit becomes an
/// error carrying the exit code and captured stderr.
pub struct ShellProcessExecutor;

impl ShellProcessExecutor {
    pub fn new() -> Self {
        Self
    }

    #[cfg(unix)]
    fn shell_command(command: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }

    #[cfg(windows)]
    fn shell_command(command: &str) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }
}

impl Default for ShellProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessExecutor for ShellProcessExecutor {
    async fn run(&self, command: &str, working_dir: &Path) -> Result<String> {
        debug!(command, working_dir = %working_dir.display(), "Spawning shell command");

        let output = Self::shell_command(command)
            .current_dir(working_dir)
            .kill_on_drop(true)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code();
            warn!(command, code = ?code, "Shell command failed");
            return Err(BridgeError::CommandFailed {
                code,
                detail: stderr.trim().to_string(),
            });
        }

        Ok(stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout() {
        let executor = ShellProcessExecutor::new();
        let output = executor.run("echo hello", Path::new(".")).await.unwrap();
        assert_eq!(output.trim(), "hello");
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let executor = ShellProcessExecutor::new();
        let dir = tempfile::tempdir().unwrap();
        let output = executor.run("pwd", dir.path()).await.unwrap();
        assert_eq!(
            std::fs::canonicalize(output.trim()).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_error_with_code() {
        let executor = ShellProcessExecutor::new();
        let err = executor
            .run("echo oops >&2; exit 3", Path::new("."))
            .await
            .unwrap_err();
        match err {
            BridgeError::CommandFailed { code, detail } => {
                assert_eq!(code, Some(3));
                assert_eq!(detail, "oops");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_shell_syntax_is_honored() {
        let executor = ShellProcessExecutor::new();
        let output = executor
            .run("printf 'a\\nb' | wc -l", Path::new("."))
            .await
            .unwrap();
        assert_eq!(output.trim(), "1");
    }
}
