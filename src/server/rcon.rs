//! Remote-console relay backed by a pre-built rcon client binary.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::config::types::ConsoleSettings;
use crate::server::Console;
use crate::system::executor::{run_captured, run_raw, CommandOutput};

pub struct RconConsole {
    binary: PathBuf,
    config: PathBuf,
}

impl RconConsole {
    pub fn new(settings: &ConsoleSettings) -> Self {
        Self {
            binary: settings.rcon_binary.clone(),
            config: settings.rcon_config.clone(),
        }
    }

    /// Build `<rcon> --config <file> <command>` with the command as a single argument.
    pub fn build_command(&self, command: &str) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.binary);
        cmd.arg("--config").arg(&self.config).arg(command);
        cmd
    }

    /// Run the client for the operator and return its status and output bytes as-is.
    pub async fn relay(&self, command: &str) -> Result<std::process::Output> {
        debug!("rcon relay: {}", command);
        run_raw(self.build_command(command)).await
    }
}

#[async_trait]
impl Console for RconConsole {
    async fn send(&self, command: &str) -> Result<CommandOutput> {
        debug!("rcon: {}", command);
        run_captured(self.build_command(command)).await
    }
}

/// Join CLI words into the single command line the console expects.
pub fn join_command(words: &[String]) -> String {
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_is_passed_as_one_argument() {
        let console = RconConsole::new(&ConsoleSettings::default());
        let cmd = console.build_command("say hello world");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(args, vec!["--config", "/srv/minecraft/scripts/rcon.yaml", "say hello world"]);
    }

    #[test]
    fn words_are_joined_with_single_spaces() {
        let words = vec!["time".to_string(), "query".to_string(), "gametime".to_string()];
        assert_eq!(join_command(&words), "time query gametime");
    }

    #[tokio::test]
    async fn client_output_is_captured_verbatim() {
        let settings = ConsoleSettings {
            rcon_binary: PathBuf::from("echo"),
            rcon_config: PathBuf::from("rcon.yaml"),
            ..ConsoleSettings::default()
        };
        let reply = RconConsole::new(&settings).send("list").await.unwrap();
        assert_eq!(reply.code, Some(0));
        assert_eq!(reply.stdout, "--config rcon.yaml list\n");
    }

    #[tokio::test]
    async fn relay_returns_client_bytes_and_status() {
        let settings = ConsoleSettings {
            rcon_binary: PathBuf::from("echo"),
            rcon_config: PathBuf::from("rcon.yaml"),
            ..ConsoleSettings::default()
        };
        let output = RconConsole::new(&settings).relay("say hi").await.unwrap();
        assert_eq!(output.status.code(), Some(0));
        assert_eq!(output.stdout, b"--config rcon.yaml say hi\n".to_vec());
        assert!(output.stderr.is_empty());
    }
}
