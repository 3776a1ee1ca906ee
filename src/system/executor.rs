//! External tool subprocess executor.
//! Every call into tmux, systemctl, tar and the rcon client goes through here
//! so spawning, tracing and status handling stay uniform.

use anyhow::{anyhow, Context, Result};
use tracing::trace;

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// None when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

fn describe(cmd: &std::process::Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().to_string()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().to_string()));
    parts.join(" ")
}

/// Run a command to completion and hand back its output bytes untouched.
pub async fn run_raw(cmd: std::process::Command) -> Result<std::process::Output> {
    let line = describe(&cmd);
    trace!("Executing: {}", line);

    let output = tokio::process::Command::from(cmd)
        .stdin(std::process::Stdio::null())
        .output()
        .await
        .with_context(|| format!("Failed to execute {}", line))?;

    trace!("{} exited with {:?}", line, output.status.code());
    Ok(output)
}

/// Run a command to completion, capturing output. A non-zero exit is not an error.
pub async fn run_captured(cmd: std::process::Command) -> Result<CommandOutput> {
    let output = run_raw(cmd).await?;

    Ok(CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run a command and fail unless it exits 0.
pub async fn run_checked(cmd: std::process::Command) -> Result<String> {
    let line = describe(&cmd);
    let output = run_captured(cmd).await?;

    if !output.success() {
        return Err(anyhow!(
            "{} failed ({}): {}",
            line,
            output.code.map_or_else(|| "signal".to_string(), |c| format!("exit {}", c)),
            output.stderr.trim()
        ));
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_exit_code_and_output() {
        let mut cmd = std::process::Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2; exit 3"]);

        let output = run_captured(cmd).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn checked_run_reports_stderr() {
        let mut cmd = std::process::Command::new("sh");
        cmd.args(["-c", "echo broken >&2; exit 2"]);

        let err = run_checked(cmd).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("exit 2"));
        assert!(message.contains("broken"));
    }

    #[tokio::test]
    async fn raw_output_keeps_non_utf8_bytes() {
        let mut cmd = std::process::Command::new("sh");
        cmd.args(["-c", "printf '\\377\\376ok'; exit 5"]);

        let output = run_raw(cmd).await.unwrap();
        assert_eq!(output.status.code(), Some(5));
        assert_eq!(output.stdout, vec![0xff, 0xfe, b'o', b'k']);
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let cmd = std::process::Command::new("/nonexistent/definitely-not-here");
        assert!(run_captured(cmd).await.is_err());
    }
}
