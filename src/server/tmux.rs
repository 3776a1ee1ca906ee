//! Hosting sessions in tmux.
//! Names are matched exactly (`=name`) so `minecraft-server` never matches a
//! prefix like `minecraft-server-old`.

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::server::{CreateOutcome, SessionHost};
use crate::system::executor::{run_captured, run_checked, CommandOutput};
use crate::system::parser::is_duplicate_session;

pub struct TmuxSessions {
    binary: PathBuf,
}

impl TmuxSessions {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("tmux"),
        }
    }

    fn command(&self) -> std::process::Command {
        std::process::Command::new(&self.binary)
    }

    pub fn has_session_command(&self, name: &str) -> std::process::Command {
        let mut cmd = self.command();
        cmd.args(["has-session", "-t", &exact_target(name)]);
        cmd
    }

    /// `new-session` fails on an existing name, which makes it the atomic create.
    pub fn new_session_command(&self, name: &str, workdir: &Path, command: &str) -> std::process::Command {
        let mut cmd = self.command();
        cmd.args(["new-session", "-d", "-s", name, "-c"])
            .arg(workdir)
            .arg(command);
        cmd
    }

    pub fn kill_session_command(&self, name: &str) -> std::process::Command {
        let mut cmd = self.command();
        cmd.args(["kill-session", "-t", &exact_target(name)]);
        cmd
    }
}

impl Default for TmuxSessions {
    fn default() -> Self {
        Self::new()
    }
}

fn exact_target(name: &str) -> String {
    format!("={}", name)
}

fn create_outcome(output: &CommandOutput) -> CreateOutcome {
    if output.success() {
        CreateOutcome::Created
    } else if is_duplicate_session(&output.stderr) {
        CreateOutcome::AlreadyExists
    } else {
        CreateOutcome::Failed(output.stderr.trim().to_string())
    }
}

#[async_trait]
impl SessionHost for TmuxSessions {
    async fn exists(&self, name: &str) -> Result<bool> {
        // Non-zero covers both "no such session" and "no server running"
        Ok(run_captured(self.has_session_command(name)).await?.success())
    }

    async fn create(&self, name: &str, workdir: &Path, command: &str) -> Result<CreateOutcome> {
        debug!("Creating tmux session '{}' in {:?}: {}", name, workdir, command);
        let output = run_captured(self.new_session_command(name, workdir, command)).await?;
        Ok(create_outcome(&output))
    }

    async fn kill(&self, name: &str) -> Result<()> {
        run_checked(self.kill_session_command(name)).await?;
        Ok(())
    }
}

/// Whether a tmux binary can be executed at all (used by the health check).
pub fn tmux_available() -> bool {
    std::process::Command::new("tmux")
        .arg("-V")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
