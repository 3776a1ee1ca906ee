//! Stop-the-world backup: stop the managed service, archive the server
//! directory, bring the service back.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;
use tracing::{error, info, warn};

use crate::config::types::{RestartPolicy, ServerConfig};
use crate::error::LifecycleError;
use crate::server::archive::backup_file_name;
use crate::server::Backends;
use crate::system::parser::parse_gametime;

#[derive(Debug, Clone, Default)]
pub struct BackupReport {
    /// Path of the archive, if it was written
    pub archive: Option<PathBuf>,
    pub archive_error: Option<String>,
    pub restarted: bool,
}

pub struct BackupController {
    config: ServerConfig,
    backends: Backends,
}

impl BackupController {
    pub fn new(config: ServerConfig, backends: Backends) -> Self {
        Self { config, backends }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Back up into the configured flat backups directory.
    pub async fn backup(&self) -> Result<BackupReport> {
        self.backup_into(&self.config.backup.backups_dir).await
    }

    /// A failed stop aborts before touching the archive. Once the service has
    /// been stopped the restart step always runs, whatever the archive did;
    /// only the restart's own failure is returned as an error.
    pub async fn backup_into(&self, dir: &Path) -> Result<BackupReport> {
        let service = self.backends.service.as_ref();
        let unit = service.unit().to_string();

        let gametime = if self.config.backup.include_gametime {
            self.query_gametime().await
        } else {
            None
        };

        let was_active = match self.config.backup.restart_policy {
            RestartPolicy::Always => true,
            RestartPolicy::IfWasRunning => match service.is_active().await {
                Ok(active) => active,
                Err(e) => {
                    warn!("Could not query {} state, assuming it was running: {:#}", unit, e);
                    true
                }
            },
        };

        info!("Stopping the server for backup");
        if let Err(e) = service.stop().await {
            error!("Failed to stop {}; backup aborted", unit);
            return Err(LifecycleError::ServiceControl {
                action: "stop",
                unit,
                detail: format!("{:#}", e),
            }
            .into());
        }

        let mut report = BackupReport::default();
        let dest = dir.join(backup_file_name(&Local::now(), gametime.as_deref()));
        info!("Creating backup file: {}", dest.display());

        match self.write_archive(dir, &dest).await {
            Ok(()) => {
                info!("Backup created: {}", dest.display());
                report.archive = Some(dest);
            }
            Err(e) => {
                error!("Backup failed: {:#}", e);
                report.archive_error = Some(format!("{:#}", e));
            }
        }

        if !was_active {
            info!("{} was not running before the backup; leaving it stopped", unit);
            return Ok(report);
        }

        info!("Starting the server");
        if let Err(e) = service.start().await {
            error!("Failed to restart {} after backup", unit);
            return Err(LifecycleError::ServiceControl {
                action: "start",
                unit,
                detail: format!("{:#}", e),
            }
            .into());
        }
        report.restarted = true;

        Ok(report)
    }

    async fn write_archive(&self, dir: &Path, dest: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;
        self.backends
            .archiver
            .archive(&self.config.server.server_dir, dest)
            .await
    }

    async fn query_gametime(&self) -> Option<String> {
        let command = &self.config.console.gametime_command;
        match self.backends.console.send(command).await {
            Ok(reply) if reply.success() => {
                let parsed = parse_gametime(&reply.stdout);
                if parsed.is_none() {
                    warn!("Could not parse gametime from: {}", reply.stdout.trim());
                }
                parsed
            }
            Ok(reply) => {
                warn!("Error getting gametime: console exited with {:?}", reply.code);
                None
            }
            Err(e) => {
                warn!("Error getting gametime: {:#}", e);
                None
            }
        }
    }
}
