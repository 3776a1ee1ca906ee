//! mcserver-ctl entry point: CLI dispatch, logging setup, exit codes.

mod app;
mod backup;
mod config;
mod daemon;
mod error;
mod server;
mod system;

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info, warn};

use app::cli::{Args, Command, HELP_TEXT};
use app::logging::{init_tracing, log_file_path, resolve_filter};
use backup::tiers::manage_backups;
use backup::BackupController;
use config::persistence::{load_config, resolve_config_path, save_config};
use config::types::ServerConfig;
use daemon::control::Lifecycle;
use daemon::liveness::is_running;
use daemon::status::{run_health_check, show_status};
use server::rcon::{join_command, RconConsole};
use server::Backends;

#[cfg(target_os = "linux")]
use daemon::systemd::{install_systemd_service, uninstall_systemd_service};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse arguments with custom error handling
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            if err.kind() == clap::error::ErrorKind::DisplayHelp {
                print!("{}", HELP_TEXT);
                std::process::exit(0);
            }
            if err.kind() == clap::error::ErrorKind::DisplayVersion {
                println!("\x1b[32mmcserver-ctl {} ({})\x1b[0m", env!("CARGO_PKG_VERSION"), std::env::consts::ARCH);
                std::process::exit(0);
            }

            eprintln!("{}", err);
            eprintln!();
            print!("{}", HELP_TEXT);
            std::process::exit(2);
        }
    };

    let config_path = resolve_config_path(args.config.as_deref())?;
    let config = match load_config(Some(config_path.as_path())).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            std::process::exit(1);
        }
    };

    let env_level = std::env::var("LOG_LEVEL").ok();
    let filter = resolve_filter(args.log_level.as_deref(), env_level.as_deref(), &config.logging.log_level);
    let log_file = match (&config.logging.log_dir, args.command.keeps_log_file()) {
        (Some(dir), true) => Some(log_file_path(dir)),
        _ => None,
    };
    init_tracing(filter, log_file.as_deref())?;

    if config_path.exists() {
        debug!("Loaded configuration from: {:?}", config_path);
    } else {
        debug!("Config file {:?} not found, using built-in defaults", config_path);
    }

    let code = match dispatch(args.command, config, &config_path).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    };

    std::process::exit(code);
}

/// Resolves when the operator presses Ctrl+C; never if the handler can't be installed.
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received (Ctrl+C)");
}

async fn dispatch(command: Command, config: ServerConfig, config_path: &Path) -> Result<i32> {
    let backends = Backends::from_config(&config);

    match command {
        Command::Rcon { words } => {
            let output = RconConsole::new(&config.console).relay(&join_command(&words)).await?;
            std::io::stdout().write_all(&output.stdout)?;
            std::io::stdout().flush()?;
            std::io::stderr().write_all(&output.stderr)?;
            Ok(output.status.code().unwrap_or(1))
        }

        Command::IsRunning => {
            let up = is_running(backends.console.as_ref(), &config.console.status_command).await;
            Ok(if up { 0 } else { 1 })
        }

        Command::Stop => {
            Lifecycle::new(config, backends).stop().await?;
            Ok(0)
        }

        Command::Start => {
            Lifecycle::new(config, backends).start(ctrl_c()).await?;
            Ok(0)
        }

        Command::Backup => {
            let report = BackupController::new(config, backends).backup().await?;
            match (&report.archive, &report.archive_error) {
                (Some(path), _) => info!("Backup complete: {} (service restarted: {})", path.display(), report.restarted),
                (None, Some(err)) => warn!("No archive was written (service restarted: {}): {}", report.restarted, err),
                (None, None) => {}
            }
            Ok(0)
        }

        Command::ManageBackups => {
            let controller = BackupController::new(config, backends);
            let report = manage_backups(&controller).await;
            info!(
                "Backup run finished: {} created, {} deleted, {} failed",
                report.created.len(),
                report.deleted.len(),
                report.failed_tiers.len()
            );
            Ok(if report.success() { 0 } else { 1 })
        }

        Command::Status => {
            show_status(&config, &backends).await?;
            Ok(0)
        }

        Command::Check => Ok(if run_health_check(&config) { 0 } else { 1 }),

        Command::Config { init } => {
            if init {
                if config_path.exists() {
                    eprintln!("ERROR: {:?} already exists; not overwriting", config_path);
                    return Ok(1);
                }
                save_config(&ServerConfig::default(), config_path).await?;
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            Ok(0)
        }

        #[cfg(target_os = "linux")]
        Command::InstallService { backup_timer } => {
            install_systemd_service(&config, config_path, backup_timer)?;
            Ok(0)
        }

        #[cfg(target_os = "linux")]
        Command::UninstallService => {
            uninstall_systemd_service(&config)?;
            Ok(0)
        }

        #[cfg(not(target_os = "linux"))]
        Command::InstallService { .. } | Command::UninstallService => {
            eprintln!("ERROR: systemd units are only supported on Linux");
            Ok(1)
        }
    }
}
