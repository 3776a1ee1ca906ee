//! Command-line argument definitions (clap) and help text.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const HELP_TEXT: &str = "
Minecraft server lifecycle and backup controller
Usage: mcserver-ctl [OPTIONS] <COMMAND>

Options:
      --config <PATH>           Config file (default: config.json next to the binary)
      --log-level <LOG_LEVEL>   Log level (TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL)
  -h, --help                    Print help
  -V, --version                 Print version
Console:
  rcon <COMMAND...>             Send a command to the server console; exits with its status
  is-running                    Exit 0 if the server answers the console, 1 otherwise
Lifecycle (run as the server owner):
  start                         Start the server session and wait until it answers
  stop                          Warn, save, stop the server and close its session
Backups:
  backup                        Stop the service, archive the server dir, start it again
  manage-backups                Create due daily/weekly/monthly backups and prune old ones
Setup & Diagnostics:
  status                        Show session, console, service and latest backup
  check                         Verify config, tools and directories
  config [--init]               Print effective config (or write defaults to the config path)
  install-service [--backup-timer]   Install the systemd unit (and daily backup timer)
  uninstall-service             Remove the systemd unit and backup timer
";

#[derive(Parser, Debug)]
#[command(name = "mcserver-ctl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Minecraft server lifecycle and backup controller", long_about = None)]
pub struct Args {
    /// Config file (default: config.json next to the binary)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Send a command to the server console
    Rcon {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        words: Vec<String>,
    },

    /// Exit 0 if the server answers the console, 1 otherwise
    IsRunning,

    /// Start the server session and wait until it answers
    Start,

    /// Warn, save, stop the server and close its session
    Stop,

    /// Stop the service, archive the server dir, start it again
    Backup,

    /// Create due daily/weekly/monthly backups and prune old ones
    ManageBackups,

    /// Show session, console, service and latest backup
    Status,

    /// Verify config, tools and directories
    Check,

    /// Print the effective configuration
    Config {
        /// Write the default configuration to the config path instead
        #[arg(long)]
        init: bool,
    },

    /// Install the systemd unit for the server
    InstallService {
        /// Also install a daily manage-backups timer
        #[arg(long = "backup-timer")]
        backup_timer: bool,
    },

    /// Remove the systemd unit and backup timer
    UninstallService,
}

impl Command {
    /// Commands whose log should also go to a timestamped file when configured.
    pub fn keeps_log_file(&self) -> bool {
        matches!(self, Command::Backup | Command::ManageBackups)
    }
}
